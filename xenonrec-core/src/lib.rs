//! Xenon PowerPC Translation Core
//!
//! This crate decodes fixed-width 32-bit big-endian PowerPC instructions
//! (including the 128-bit VMX128 vector extension) and lowers them into a
//! typed, basic-block-structured intermediate representation for a host
//! code generator to consume.
//!
//! # Pipeline
//! 1. [`translator::dispatch::DispatchTables`] — built once at startup,
//!    resolves a raw word to its instruction descriptor.
//! 2. [`translator::decoder::InstrData`] — per-format field extraction.
//! 3. [`translator::translate_function`] — drives the per-opcode semantic
//!    emitters against an [`ir::builder::FunctionBuilder`].
//! 4. The finished block/instruction graph is handed off via
//!    [`ir::builder::FunctionBuilder::dump`] or direct traversal.

pub mod error;
pub mod ir;
pub mod translator;
