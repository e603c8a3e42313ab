//! pw-inspector: host-agnostic core of the in-page element inspector.
//!
//! The inspector lets a host automation process pick elements in a rendered
//! document and derive CSS selectors for them, and validate CSS or XPath
//! expressions against the live document. The rendering environment is a
//! collaborator reached through the [`Document`] and [`EventSource`] traits;
//! the host is reached through [`HostBridge`].
//!
//! # Examples
//!
//! ```ignore
//! use pw_inspector::{InspectorConfig, MemoryDocument, RecordingBridge, Session, SyntheticEvent};
//! use pw_inspector::dom::Document;
//!
//! let doc = MemoryDocument::parse(r#"<div id="app"><p>Hello</p><p>World</p></div>"#)?;
//! let bridge = RecordingBridge::new();
//! let mut session = Session::new(doc.clone(), Some(bridge.clone()), InspectorConfig::default());
//!
//! session.start()?;
//! let second = doc.query_css("p")?[1];
//! session.handle_click(&SyntheticEvent::on(second));
//! assert_eq!(bridge.descriptors()[0].css_selector, "div#app p:nth-of-type(2)");
//!
//! let result = session.test_query(".missing", "css", "req-1");
//! assert!(result.results.is_empty());
//! ```
//!
//! # Main Types
//!
//! - [`Session`] - inspection state machine owning highlight and overlay
//! - [`HighlightTracker`] - single-element hover marker
//! - [`synthesize_selector`] - element to hierarchical selector
//! - [`MemoryDocument`] - in-memory [`Document`] with CSS and XPath engines

pub mod bridge;
pub mod config;
pub mod dom;
mod error;
pub mod highlight;
pub mod live_query;
pub mod memory;
pub mod selector;
pub mod session;

pub use bridge::{BridgeCall, HostBridge, RecordingBridge};
pub use config::{Combinator, HighlightStyle, InspectorConfig, OverlayStyle};
pub use dom::{Document, DomEvent, EventSource, SyntheticEvent, XPathHit};
pub use error::{BridgeError, DomError, Fault, InspectorError, Result};
pub use highlight::HighlightTracker;
pub use memory::MemoryDocument;
pub use pw_inspector_protocol as protocol;
pub use selector::{escape_css_ident, synthesize_selector, synthesize_selector_with};
pub use session::{ClickOutcome, Session, SessionState};
