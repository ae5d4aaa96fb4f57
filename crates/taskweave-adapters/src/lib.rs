//! HTTP-backed skill handlers for taskweave.
//!
//! Skills implement [`taskweave_kernel::SkillHandler`] and make every
//! outbound call through [`ResilientHttpClient`], which applies the
//! configured retry policy.
//!
//! | Intent        | Skill                       |
//! |---------------|-----------------------------|
//! | `SearchWeb`   | [`skills::WebSearchSkill`]  |
//! | `SendWebhook` | [`skills::WebhookSkill`]    |

pub mod error;
pub mod http;
pub mod skills;

pub use error::{AdapterError, Result};
pub use http::{ResilientHttpClient, map_reqwest_error};
pub use skills::{SearchHit, WebSearchSkill, WebhookSkill, register_default_skills};
