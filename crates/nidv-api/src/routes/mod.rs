//! # API Routes
//!
//! | Method | Path                   | Module          |
//! |--------|------------------------|-----------------|
//! | POST   | `/api/v1/national-id`  | [`national_id`] |

pub mod national_id;
