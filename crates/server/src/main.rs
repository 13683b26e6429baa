#[tokio::main]
async fn main() -> anyhow::Result<()> {
    phonebook_server::run().await
}
