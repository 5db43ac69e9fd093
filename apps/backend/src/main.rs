#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vocab_backend::run().await
}
