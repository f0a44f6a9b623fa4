//! Create a disposable mailbox, watch it for a minute, then delete it.

use mailtm_client::{Client, SessionController, UsernamePolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), mailtm_client::Error> {
    let client = Client::new()?;
    let mut controller = SessionController::new(client);

    let address = controller.start(UsernamePolicy::Random).await?;
    println!("Mailbox ready: {address}");
    println!("Watching for mail for 60 seconds (send something to it now)...");

    let mut shown = 0;
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let messages = controller.messages();
        for msg in &messages[shown..] {
            println!("From: {}", msg.from.address);
            println!("Subject: {}", msg.subject);
            match (&msg.text, &msg.html) {
                (Some(text), _) => println!("{text}"),
                (None, Some(html)) => println!("{}", html.joined()),
                (None, None) => println!("{}", msg.intro),
            }
            println!("-------------------");
        }
        shown = messages.len();
    }

    println!("Deleting {address}...");
    controller.teardown().await?;
    println!("Done.");
    Ok(())
}
