//! Published capability sets.
//!
//! Built once per process. A declaration error here is a bug in this file,
//! so it panics on first use rather than being reported to callers.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::model::{Protocol, ProtocolBuilder};

fn published(builder: ProtocolBuilder) -> Arc<Protocol> {
    let name = builder.name().to_string();
    match builder.build() {
        Ok(protocol) => protocol,
        Err(e) => panic!("published protocol `{}` is invalid: {}", name, e),
    }
}

lazy_static! {
    /// Values that read and apply typed configuration.
    pub static ref CONFIGURABLE: Arc<Protocol> = published(
        Protocol::builder("Configurable")
            .method("read_config")
            .method("apply_config")
    );

    /// Values supporting cooperative cancellation.
    pub static ref CANCELLABLE: Arc<Protocol> = published(
        Protocol::builder("Cancellable")
            .method("cancel")
            .method("is_cancelled")
    );

    /// Types that construct instances of themselves by name.
    pub static ref FACTORY: Arc<Protocol> = published(
        Protocol::builder("Factory").class_method("create")
    );

    pub static ref RENDERABLE: Arc<Protocol> = published(
        Protocol::builder("Renderable").method("render")
    );
}

/// Every published protocol, in a stable order.
pub fn published_protocols() -> Vec<Arc<Protocol>> {
    vec![
        CONFIGURABLE.clone(),
        CANCELLABLE.clone(),
        FACTORY.clone(),
        RENDERABLE.clone(),
    ]
}
