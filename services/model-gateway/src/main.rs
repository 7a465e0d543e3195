use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    model_gateway::run().await
}
