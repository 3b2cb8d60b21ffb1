//! Delete a card.

use anyhow::Result;
use board_client::{BoardClient, RemoteGateway};
use board_types::CardId;

use super::{locate_card, settle};

/// Run the rm command.
pub async fn run<G: RemoteGateway + 'static>(client: &BoardClient<G>, card_id: &CardId) -> Result<()> {
    let (list_id, _) = locate_card(&client.board(), card_id)?;
    settle(client.delete_card(&list_id, card_id)?).await?;
    println!("Deleted {card_id}");
    Ok(())
}
