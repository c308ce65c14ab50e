use std::io::{self, BufRead, Write};

use anyhow::Result;
use dotenv::dotenv;

use chat_relay::store::http::HttpRelay;
use chat_relay::store::ConversationStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let relay = HttpRelay::from_env();
    let mut store = ConversationStore::new();

    println!("Type a message and press enter. 'exit' quits.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input == "exit" || input == "quit" {
            break;
        }

        if !store.submit(input, &relay).await {
            continue;
        }

        if let Some(reply) = store.messages().last() {
            println!("assistant> {}", reply.content);
        }
    }

    Ok(())
}
