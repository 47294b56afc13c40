/// Integration tests for the collection store covering collection
/// lifecycle, persistence, and the chunk-embed-store pipeline.

mod helpers;
mod pipeline;
mod store_ops;
