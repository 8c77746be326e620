#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    biodata_maker::run().await
}
