//! Schema-driven configuration forms bound to a remote key-value store.
//!
//! This crate is the headless engine behind the operator-facing settings
//! page. It turns a declarative option schema into stateful widgets, keeps
//! every widget synchronized with the value persisted under its name on the
//! remote host, and shows or hides widgets according to small `showIf`
//! boolean expressions over the values of other widgets. Transport, page
//! bootstrap, and presentation live outside this crate; the host layer only
//! supplies a [`store::RemoteStore`] and forwards user input to
//! [`widget::Widget::handle_input`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`schema`] | Option schema document types and per-entry parsing |
//! | [`value`] | Logical value type and wire-string conversions |
//! | [`expr`] | `showIf` expression lexer, parser, and evaluator |
//! | [`widget`] | The widget variants and their notification lists |
//! | [`element`] | Headless element tree produced by rendering |
//! | [`builder`] | Form construction, value loading, and persistence wiring |
//! | [`visibility`] | Conditional visibility rules between widgets |
//! | [`store`] | Remote store seam, in-memory store, and the persist queue |
//! | [`query`] | Query-string sink used by generator mode |

pub mod builder;
pub mod element;
pub mod expr;
pub mod query;
pub mod schema;
pub mod store;
pub mod value;
pub mod visibility;
pub mod widget;

pub use builder::{Form, FormBuilder};
pub use schema::{FormSchema, OptionSchema, SchemaError};
pub use query::QuerySink;
pub use store::{
    ChangeSink, MemoryStore, PersistQueue, PersistReceiver, PersistRequest, RemoteStore, StoreError, drain_persist_queue,
};
pub use value::Value;
pub use widget::{UserInput, Widget, WidgetError};
