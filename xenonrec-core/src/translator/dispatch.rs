//! Opcode dispatch tables.
//!
//! One-time, process-wide construction of dense lookup tables per opcode
//! bucket, indexed by the bit range that distinguishes sibling opcodes in
//! that bucket, plus a linear-scan resolver over (pattern, mask) pairs for
//! the extended vector-opcode space, whose distinguishing bit positions vary
//! per sub-family. Both strategies resolve to the same descriptor shape.
//!
//! Registration policy: the last registration wins for an exact slot, and a
//! pattern owner fills every slot consistent with its don't-care bits
//! ("duplicate-fill"), since later decode does no masking. A registration
//! that displaces a *different* pattern is logged — the priority rule for
//! genuinely overlapping patterns is intentionally surfaced, not assumed.
//!
//! Build the tables once during startup and pass them by reference into
//! every decoder; they are immutable for the process lifetime.

use bitvec::vec::BitVec;
use smallvec::SmallVec;

use crate::error::TranslateError;
use crate::translator::decoder::InstrData;
use crate::translator::tables;
use crate::translator::FunctionTranslator;

/// Semantic-emit handler: replays one guest instruction's architectural
/// effect against the function under construction.
pub type EmitFn = fn(&mut FunctionTranslator<'_>, &InstrData) -> Result<(), TranslateError>;

/// Disassembly handler: renders one instruction as text.
pub type DisasmFn = fn(&InstrType, &InstrData, &mut String);

/// Select the (LSB-relative) bit range [a, b] of a word.
pub fn select_bits(value: u32, a: u32, b: u32) -> u32 {
    (value >> a) & ((1u64 << (b - a + 1)) - 1) as u32
}

/// Encoding format of an instruction, which fixes both the field layout and
/// the mask of opcode-significant bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrFormat {
    I,
    B,
    Sc,
    D,
    Ds,
    X,
    Xl,
    Xfx,
    Xo,
    M,
    Md,
    A,
    Vx,
    Vxa,
    Vxr,
    Vx128,
    Vx128_1,
    Vx128_2,
    Vx128_3,
    Vx128_4,
    Vx128_5,
    Vx128P,
    Vx128R,
}

impl InstrFormat {
    /// Mask of the bits that identify the opcode within this format.
    pub fn mask(self) -> u32 {
        match self {
            InstrFormat::I | InstrFormat::B | InstrFormat::D | InstrFormat::M | InstrFormat::Md => {
                0xFC00_0000
            }
            InstrFormat::Sc => 0xFC00_0002,
            InstrFormat::Ds => 0xFC00_0003,
            InstrFormat::X | InstrFormat::Xl | InstrFormat::Xfx | InstrFormat::Xo => 0xFC00_07FE,
            InstrFormat::A => 0xFC00_003E,
            InstrFormat::Vx => 0xFC00_07FF,
            InstrFormat::Vxa => 0xFC00_003F,
            InstrFormat::Vxr => 0xFC00_03FF,
            InstrFormat::Vx128 => 0xFC00_03D0,
            InstrFormat::Vx128_1 => 0xFC00_07F3,
            InstrFormat::Vx128_2 => 0xFC00_0210,
            InstrFormat::Vx128_3 => 0xFC00_07F0,
            InstrFormat::Vx128_4 => 0xFC00_0730,
            InstrFormat::Vx128_5 => 0xFC00_0010,
            InstrFormat::Vx128P => 0xFC00_0630,
            InstrFormat::Vx128R => 0xFC00_0390,
        }
    }

    /// Formats whose distinguishing bit positions vary per sub-family are
    /// resolved by linear scan instead of a dense table.
    pub fn uses_scan(self) -> bool {
        matches!(
            self,
            InstrFormat::Vxa
                | InstrFormat::Vxr
                | InstrFormat::Vx128
                | InstrFormat::Vx128_1
                | InstrFormat::Vx128_2
                | InstrFormat::Vx128_3
                | InstrFormat::Vx128_4
                | InstrFormat::Vx128_5
                | InstrFormat::Vx128P
                | InstrFormat::Vx128R
        )
    }
}

/// Coarse classification used by function scanning and branch handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrKind {
    General,
    BranchCond,
    BranchAlways,
    Syscall,
}

/// Static, process-lifetime instruction descriptor. Built once at startup;
/// read-only thereafter.
#[derive(Debug, Clone, Copy)]
pub struct InstrType {
    /// Canonical opcode pattern with don't-care bits zeroed.
    pub opcode: u32,
    /// Mask of opcode-significant bits (used directly by scan resolution).
    pub mask: u32,
    pub format: InstrFormat,
    pub kind: InstrKind,
    pub name: &'static str,
    /// `None` marks an opcode that declines translation; the consuming
    /// translator must emit a guest-visible trap instead.
    pub emit: Option<EmitFn>,
    pub disasm: Option<DisasmFn>,
}

/// Index range (LSB-relative, inclusive) of the dense table for one bucket.
#[derive(Debug, Clone, Copy)]
struct BucketSpec {
    primary: u32,
    lo: u32,
    hi: u32,
}

const BUCKETS: &[BucketSpec] = &[
    BucketSpec { primary: 4, lo: 0, hi: 10 },
    BucketSpec { primary: 19, lo: 1, hi: 10 },
    BucketSpec { primary: 30, lo: 0, hi: 0 },
    BucketSpec { primary: 31, lo: 1, hi: 10 },
    BucketSpec { primary: 58, lo: 0, hi: 1 },
    BucketSpec { primary: 59, lo: 1, hi: 5 },
    BucketSpec { primary: 62, lo: 0, hi: 1 },
    BucketSpec { primary: 63, lo: 1, hi: 10 },
];

fn bucket_spec(primary: u32) -> Option<BucketSpec> {
    BUCKETS.iter().copied().find(|b| b.primary == primary)
}

/// One dense table plus the coverage map backing the completeness check.
struct DenseTable {
    spec: BucketSpec,
    slots: Vec<Option<u16>>,
    filled: BitVec,
}

impl DenseTable {
    fn new(spec: BucketSpec) -> DenseTable {
        let size = 1usize << (spec.hi - spec.lo + 1);
        DenseTable {
            spec,
            slots: vec![None; size],
            filled: BitVec::repeat(false, size),
        }
    }
}

/// Immutable dispatch tables. `Sync`: share one instance across all
/// translation threads by reference.
pub struct DispatchTables {
    entries: Vec<InstrType>,
    /// Primary table indexed by bits 26-31.
    primary: Vec<Option<u16>>,
    primary_filled: BitVec,
    dense: Vec<DenseTable>,
    /// Scan entries for the extended vector-opcode space. Small and hot:
    /// every dense miss walks it in registration order.
    scan: SmallVec<[u16; 32]>,
}

/// Accumulates registrations, then freezes them into [`DispatchTables`].
pub struct TableBuilder {
    entries: Vec<InstrType>,
}

impl TableBuilder {
    pub fn new() -> TableBuilder {
        TableBuilder { entries: Vec::new() }
    }

    /// Register a descriptor whose mask is the format default.
    pub fn register(&mut self, entry: InstrType) {
        self.entries.push(entry);
    }

    fn finish(self) -> DispatchTables {
        let mut tables = DispatchTables {
            entries: self.entries,
            primary: vec![None; 64],
            primary_filled: BitVec::repeat(false, 64),
            dense: BUCKETS.iter().map(|b| DenseTable::new(*b)).collect(),
            scan: SmallVec::new(),
        };
        for index in 0..tables.entries.len() {
            let entry = tables.entries[index];
            let index = index as u16;
            if entry.format.uses_scan() {
                tables.scan.push(index);
                continue;
            }
            let primary = entry.opcode >> 26;
            match bucket_spec(primary) {
                None => {
                    fill_slot(
                        &mut tables.primary,
                        &mut tables.primary_filled,
                        &tables.entries,
                        primary as usize,
                        index,
                    );
                }
                Some(spec) => {
                    let table = tables
                        .dense
                        .iter_mut()
                        .find(|t| t.spec.primary == primary)
                        .unwrap();
                    let ordinal = select_bits(entry.opcode, spec.lo, spec.hi) as usize;
                    if entry.format == InstrFormat::A {
                        // A-format entries leave the FRC field inside the
                        // index range as don't-care bits; replicate across
                        // every index value consistent with them.
                        for m in 0..32usize {
                            fill_slot(
                                &mut table.slots,
                                &mut table.filled,
                                &tables.entries,
                                ordinal + (m << 5),
                                index,
                            );
                        }
                    } else if entry.format == InstrFormat::Md {
                        // The 64-bit rotate family shares one uber entry
                        // across the whole bucket.
                        for slot in 0..table.slots.len() {
                            fill_slot(
                                &mut table.slots,
                                &mut table.filled,
                                &tables.entries,
                                slot,
                                index,
                            );
                        }
                    } else {
                        fill_slot(
                            &mut table.slots,
                            &mut table.filled,
                            &tables.entries,
                            ordinal,
                            index,
                        );
                    }
                }
            }
        }
        tables
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_slot(
    slots: &mut [Option<u16>],
    filled: &mut BitVec,
    entries: &[InstrType],
    slot: usize,
    index: u16,
) {
    if let Some(previous) = slots[slot] {
        let prev = &entries[previous as usize];
        let new = &entries[index as usize];
        if prev.opcode != new.opcode {
            // Last registration wins; surface genuine overlaps instead of
            // resolving them silently.
            log::warn!(
                "dispatch overlap: {} (0x{:08X}) displaces {} (0x{:08X}) at slot {}",
                new.name,
                new.opcode,
                prev.name,
                prev.opcode,
                slot
            );
        }
    }
    slots[slot] = Some(index);
    filled.set(slot, true);
}

impl DispatchTables {
    /// Build the full dispatch tables from the static registration list.
    pub fn build() -> DispatchTables {
        let mut builder = TableBuilder::new();
        tables::register_all(&mut builder);
        builder.finish()
    }

    /// All registered descriptors, in registration order.
    pub fn entries(&self) -> &[InstrType] {
        &self.entries
    }

    /// Resolve a raw word to its descriptor. `None` is the null-descriptor
    /// sentinel for a word that matches nothing; callers must check it
    /// before use.
    pub fn lookup(&self, code: u32) -> Option<&InstrType> {
        let primary = code >> 26;
        let slot = match bucket_spec(primary) {
            None => self.primary[primary as usize],
            Some(spec) => {
                let table = self
                    .dense
                    .iter()
                    .find(|t| t.spec.primary == primary)
                    .unwrap();
                table.slots[select_bits(code, spec.lo, spec.hi) as usize]
            }
        };
        if let Some(index) = slot {
            return Some(&self.entries[index as usize]);
        }

        // Slow path: linear scan over the irregular vector-opcode space.
        self.scan
            .iter()
            .map(|&index| &self.entries[index as usize])
            .find(|entry| entry.opcode == code & entry.mask)
    }

    /// Verify that every registered pattern's don't-care projections landed
    /// in filled slots. Returns the names of entries with unfilled slots.
    pub fn verify_coverage(&self) -> Result<(), Vec<&'static str>> {
        let mut missing = Vec::new();
        for entry in &self.entries {
            if entry.format.uses_scan() {
                continue;
            }
            let primary = entry.opcode >> 26;
            let covered = match bucket_spec(primary) {
                None => self.primary_filled[primary as usize],
                Some(spec) => {
                    let table = self
                        .dense
                        .iter()
                        .find(|t| t.spec.primary == primary)
                        .unwrap();
                    let ordinal = select_bits(entry.opcode, spec.lo, spec.hi) as usize;
                    if entry.format == InstrFormat::A {
                        (0..32usize).all(|m| table.filled[ordinal + (m << 5)])
                    } else {
                        table.filled[ordinal]
                    }
                }
            };
            if !covered {
                missing.push(entry.name);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}
