//! Wire formats exchanged with compliance modules.
//!
//! Module predicates speak the Ethereum ABI word layout: a 4-byte selector
//! followed by 32-byte argument words, answered by a single boolean word.
//! All parsers are panic-free: malformed payloads are reported as
//! `VerityError` so the dispatcher can degrade them to a non-affirmative
//! answer instead of failing the whole query.

pub mod abi;
