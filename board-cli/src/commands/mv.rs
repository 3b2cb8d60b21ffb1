//! Move a card to a position in a list.

use anyhow::Result;
use board_client::{BoardClient, RemoteGateway};
use board_core::MoveIntent;
use board_types::CardId;

use super::{locate_card, resolve_list, settle};

/// Run the mv command. `index` is clamped to the destination length.
pub async fn run<G: RemoteGateway + 'static>(
    client: &BoardClient<G>,
    card_id: &CardId,
    list: &str,
    index: usize,
) -> Result<()> {
    let board = client.board();
    let (from_list_id, from_index) = locate_card(&board, card_id)?;
    let to_list_id = resolve_list(&board, list)?;

    let in_flight = client.move_card(MoveIntent {
        card_id: card_id.clone(),
        from_list_id,
        from_index,
        to_list_id: to_list_id.clone(),
        to_index: index,
    })?;
    settle(in_flight).await?;

    let (_, position) = locate_card(&client.board(), card_id)?;
    println!("Moved {card_id} to {to_list_id} at position {position}");
    Ok(())
}
