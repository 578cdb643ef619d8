//! Blog Portal - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = blog_portal::run().await {
        eprintln!("blog-portal failed: {:#}", e);
        std::process::exit(1);
    }
}
