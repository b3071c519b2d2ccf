#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leadline_lib::run().await
}
