pub mod error;
pub mod html;
pub mod io;
pub mod json;
pub mod metrics;
pub mod models;
pub mod render;
pub mod state;

pub use error::RenderError;
pub use html::{HtmlRenderInput, HtmlRenderer};
pub use io::AtomicWriter;
pub use json::render_daily_json;
pub use metrics::{RenderMetrics, RenderMetricsSnapshot};
pub use models::{GeneratedFile, RenderManifest, RenderResult};
pub use render::{RenderConfig, StaticRenderer};
pub use state::{IllegalTransition, RenderState, RenderStateMachine};
