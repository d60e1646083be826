#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stock_advisor_lib::run().await
}
