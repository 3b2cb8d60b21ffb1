//! Rename a card.

use anyhow::Result;
use board_client::{BoardClient, RemoteGateway};
use board_types::CardId;

use super::{locate_card, settle};

/// Run the edit command.
pub async fn run<G: RemoteGateway + 'static>(client: &BoardClient<G>, card_id: &CardId, title: &str) -> Result<()> {
    let (list_id, _) = locate_card(&client.board(), card_id)?;
    settle(client.edit_card(&list_id, card_id, title)?).await?;
    println!("Renamed {card_id} to \"{title}\"");
    Ok(())
}
