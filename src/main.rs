#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mental_wellness_bot::run_bot().await
}
