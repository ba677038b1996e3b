//! Antelope signing-request (ESR) support.
//!
//! Decodes `esr:` URIs into a [`SigningRequest`], resolves placeholder
//! names and template headers against live chain state, and models the
//! approval/rejection callback bodies the protocol expects.

pub mod alias;
pub mod callback;
pub mod error;
pub mod request;

pub use alias::{alias_for_chain_id, chain_id_for_alias, CHAIN_ALIASES};
pub use callback::{callback_origin, extract_uid, rejection_payload, CallbackPayload};
pub use error::EsrError;
pub use request::{
    ChainRef, InfoPair, RequestBody, RequestSignature, ResolvedSigningRequest, SigningRequest,
    FLAG_BACKGROUND, FLAG_BROADCAST,
};
