use pipeline_queue::app;

#[tokio::main]
async fn main() {
    app::startup::startup().await;
}
