//! # streams-rs
//!
//! Declarative collection pipelines and functional combinators over
//! customer records.
//!
//! ## Overview
//!
//! - **Function roles**: `Function`, `UnaryOperator`, `BinaryOperator`,
//!   `Predicate`, `Consumer`, `Supplier` and `Comparator`, with their
//!   composition combinators
//! - **Typed pipelines**: `Pipeline` chains map/filter/sort/distinct/
//!   skip/limit over any iterator, lazily
//! - **Declarative pipelines**: `StagePipeline` evaluates an ordered list of
//!   `Stage` descriptors against a borrowed source
//! - **Pipeline DSL**: `.pipe` text lowered onto `StagePipeline`
//!
//! ## Example
//!
//! ```
//! use streams_rs::{Customer, StagePipeline};
//!
//! let customers = vec![
//!     Customer::new(1, "Ama", "Mensah", "ama@example.com", "Female", 15),
//!     Customer::new(2, "Esi", "Owusu", "esi@example.com", "Female", 51),
//!     Customer::new(3, "Yaw", "Asante", "yaw@example.com", "Male", 51),
//! ];
//!
//! let over_fifty = StagePipeline::new(&customers)
//!     .filter(|c| c.age() > 50)
//!     .count()
//!     .unwrap();
//!
//! assert_eq!(over_fifty, 2);
//! ```

pub mod dsl;
pub mod error;
pub mod function;
pub mod greeting;
pub mod loader;
pub mod pipeline;
pub mod record;
pub mod scores;
pub mod sink;
pub mod stage;

pub use dsl::{Command, Outcome, Plan, execute_pipeline, parse_commands, plan, run_plan};
pub use error::{Result, StreamError};
pub use function::{
    BinaryOperator, Comparator, Consumer, Function, Predicate, Supplier, UnaryOperator,
};
pub use greeting::{EnglishGreeting, Greeting, Language, greeting_for};
pub use loader::{load_customers, parse_customers};
pub use pipeline::{Pipeline, from_slice};
pub use record::{Customer, Field, Item};
pub use scores::{AppendOptions, AppendReport, write_scores};
pub use sink::{MemorySink, Sink, WriterSink};
pub use stage::{Collected, ContainerKind, Element, Stage, StagePipeline};
