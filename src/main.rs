#[tokio::main]
async fn main() -> std::io::Result<()> {
    word_duel_server::run_with_config().await
}
