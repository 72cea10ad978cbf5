// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! # Authentication Module
//!
//! Request authentication for HIT modules, delegated to the provisioning
//! service.
//!
//! ## Auth Flow
//!
//! 1. The trusted gateway injects `X-HIT-Service-Token` (preferred) or the
//!    caller sends `Authorization: Bearer <token>`
//! 2. The module extracts the token and, for routing hints only, decodes its
//!    claims locally without any signature check
//! 3. The provisioner validates the token authoritatively, optionally
//!    checking module/method ACL
//!
//! ## Security
//!
//! - Locally decoded claims never satisfy an authorization decision;
//!   only provisioner-verified claims do (enforced by the
//!   `UnverifiedClaims`/`VerifiedClaims` type split)
//! - Provisioner unreachability is a 503, never a silent allow
//! - ACL denials carry the provisioner's reason verbatim

pub mod error;
pub mod gate;
pub mod token;

pub use error::AuthError;
pub use gate::{auth_middleware, method_acl_middleware, require_method_acl, require_token, Auth};
pub use token::{ExtractedToken, TokenSource, SERVICE_TOKEN_HEADER};
