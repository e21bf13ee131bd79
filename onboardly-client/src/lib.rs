//! # Onboardly Client Library
//!
//! The front-end logic of the login and registration pages, independent of
//! any rendering layer.
//!
//! ## Modules
//!
//! - `api`: Typed HTTP client and the `AuthApi` seam
//! - `auth`: Client-side authentication context
//! - `error`: Client error types
//! - `form`: Field state and aggregate validity
//! - `login`: Login form state machine
//! - `register`: Registration form state machine
//! - `validator`: Per-field validation rules
//!
//! ## Example
//!
//! ```no_run
//! use onboardly_client::{api::ApiClient, auth::AuthContext, login::LoginForm};
//!
//! # async fn example() -> Result<(), onboardly_client::error::ClientError> {
//! let api = ApiClient::new("http://127.0.0.1:3001")?;
//! let mut auth = AuthContext::restore(&api).await?;
//! let mut form = LoginForm::new();
//! form.on_mount(&auth);
//!
//! form.input("email", "a@b.com");
//! form.input("password", "secret1");
//! form.submit(&api, &mut auth).await;
//!
//! if let Some(route) = form.redirect() {
//!     println!("navigate to {}", route);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod error;
pub mod form;
pub mod login;
pub mod register;
pub mod validator;
