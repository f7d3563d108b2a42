#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    pkl_document_server::run().await
}
