//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use amphora_core::prelude::*;
//! ```

pub use crate::{
    AmphoraConfig, AmphoraError, Component, Manifest, Page, PageError, PageHandler, PageRequest,
    PreloadContext, PreloadFailure, PreloadRequest, Props, RenderOutput, RenderProps, Renderer,
    ResponseParts, RoutePart, Session, SessionGetter,
};

pub use amphora_data::prelude::*;
pub use amphora_router::prelude::*;
