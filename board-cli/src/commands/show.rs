//! Print the board.

use anyhow::Result;
use board_core::Board;

/// Render the board as text, one section per list.
pub fn render(board: &Board) -> String {
    let mut out = String::new();
    for list in board.lists() {
        out.push_str(&format!("{} [{}]\n", list.title, list.id));
        if list.cards.is_empty() {
            out.push_str("  (empty)\n");
        }
        for (index, card) in list.cards.iter().enumerate() {
            out.push_str(&format!(
                "  {index}. {}  ({}, order {})\n",
                card.title, card.id, card.sort_order
            ));
        }
    }
    out
}

/// Run the show command.
pub fn run(board: &Board) -> Result<()> {
    print!("{}", render(board));
    Ok(())
}
