#[tokio::main]
async fn main() -> anyhow::Result<()> {
    irrigation_relay::host::run().await
}
