// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod entity;
pub mod flatten;
pub mod forms;
pub mod ids;
pub mod list;
pub mod schema;
pub mod sync;

pub use entity::*;
pub use flatten::*;
pub use forms::*;
pub use ids::*;
pub use list::*;
pub use schema::*;
pub use sync::*;
