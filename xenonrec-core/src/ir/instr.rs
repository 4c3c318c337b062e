//! IR instructions and their static opcode descriptors.
//!
//! Every opcode carries a fixed operand-signature shape and a flag word; the
//! builder validates operands against the signature when it appends an
//! instruction, and the dump uses the signature to render operands.

use crate::ir::block::{BlockId, LabelId};
use crate::ir::value::ValueId;

/// Shape of one operand slot in an opcode signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    None,
    /// A value arena handle.
    Value,
    /// A branch-target label handle.
    Label,
    /// A raw integer payload (context offset, swizzle mask, comment index).
    Offset,
}

/// Fixed operand-signature shape of an opcode: destination plus up to three
/// sources.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub dest: OperandShape,
    pub src1: OperandShape,
    pub src2: OperandShape,
    pub src3: OperandShape,
}

const fn sig(
    dest: OperandShape,
    src1: OperandShape,
    src2: OperandShape,
    src3: OperandShape,
) -> Signature {
    Signature { dest, src1, src2, src3 }
}

/// Opcode property flags.
pub mod opcode_flags {
    /// Instruction ends its block; no instruction may follow it.
    pub const BRANCH: u32 = 1 << 0;
    /// Has a memory side effect; may not be reordered or eliminated.
    pub const MEMORY: u32 = 1 << 1;
    /// Operand order does not matter.
    pub const COMMUTATIVE: u32 = 1 << 2;
    /// Never eliminated even if the destination is unused.
    pub const VOLATILE: u32 = 1 << 3;
    /// Skipped by the text dump.
    pub const HIDE: u32 = 1 << 4;
}

/// Static descriptor for one IR opcode.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub name: &'static str,
    pub signature: Signature,
    pub flags: u32,
}

macro_rules! define_opcodes {
    ($( $variant:ident => $name:literal, ($d:ident, $s1:ident, $s2:ident, $s3:ident), $flags:expr; )*) => {
        /// IR operation selector. `info()` returns the matching descriptor.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Opcode {
            $( $variant, )*
        }

        static OPCODE_INFO: &[OpcodeInfo] = &[
            $(
                OpcodeInfo {
                    name: $name,
                    signature: sig(
                        OperandShape::$d,
                        OperandShape::$s1,
                        OperandShape::$s2,
                        OperandShape::$s3,
                    ),
                    flags: $flags,
                },
            )*
        ];

        impl Opcode {
            pub fn info(self) -> &'static OpcodeInfo {
                &OPCODE_INFO[self as usize]
            }
        }
    };
}

use opcode_flags::{BRANCH, COMMUTATIVE, HIDE, MEMORY, VOLATILE};

define_opcodes! {
    Comment           => "comment",            (None, Offset, None, None), HIDE | VOLATILE;
    Nop               => "nop",                (None, None, None, None), 0;
    SourceOffset      => "source_offset",      (None, Offset, None, None), HIDE | VOLATILE;
    DebugBreak        => "debug_break",        (None, None, None, None), VOLATILE;
    Trap              => "trap",               (None, None, None, None), VOLATILE;
    TrapTrue          => "trap_true",          (None, Value, None, None), VOLATILE;
    Call              => "call",               (None, Value, None, None), BRANCH;
    CallTrue          => "call_true",          (None, Value, Value, None), BRANCH;
    Return            => "return",             (None, None, None, None), BRANCH;
    ReturnTrue        => "return_true",        (None, Value, None, None), BRANCH;
    Branch            => "branch",             (None, Label, None, None), BRANCH;
    BranchTrue        => "branch_true",        (None, Value, Label, None), BRANCH;
    BranchFalse       => "branch_false",       (None, Value, Label, None), BRANCH;
    Assign            => "assign",             (Value, Value, None, None), 0;
    Cast              => "cast",               (Value, Value, None, None), 0;
    ZeroExtend        => "zero_extend",        (Value, Value, None, None), 0;
    SignExtend        => "sign_extend",        (Value, Value, None, None), 0;
    Truncate          => "truncate",           (Value, Value, None, None), 0;
    Convert           => "convert",            (Value, Value, None, None), 0;
    LoadContext       => "load_context",       (Value, Offset, None, None), 0;
    StoreContext      => "store_context",      (None, Offset, Value, None), 0;
    Load              => "load",               (Value, Value, None, None), MEMORY;
    LoadOffset        => "load_offset",        (Value, Value, Value, None), MEMORY;
    Store             => "store",              (None, Value, Value, None), MEMORY;
    StoreOffset       => "store_offset",       (None, Value, Value, Value), MEMORY;
    MemoryBarrier     => "memory_barrier",     (None, None, None, None), MEMORY | VOLATILE;
    Select            => "select",             (Value, Value, Value, Value), 0;
    IsTrue            => "is_true",            (Value, Value, None, None), 0;
    IsFalse           => "is_false",           (Value, Value, None, None), 0;
    CompareEq         => "compare_eq",         (Value, Value, Value, None), COMMUTATIVE;
    CompareNe         => "compare_ne",         (Value, Value, Value, None), COMMUTATIVE;
    CompareSlt        => "compare_slt",        (Value, Value, Value, None), 0;
    CompareSle        => "compare_sle",        (Value, Value, Value, None), 0;
    CompareSgt        => "compare_sgt",        (Value, Value, Value, None), 0;
    CompareSge        => "compare_sge",        (Value, Value, Value, None), 0;
    CompareUlt        => "compare_ult",        (Value, Value, Value, None), 0;
    CompareUle        => "compare_ule",        (Value, Value, Value, None), 0;
    CompareUgt        => "compare_ugt",        (Value, Value, Value, None), 0;
    CompareUge        => "compare_uge",        (Value, Value, Value, None), 0;
    Add               => "add",                (Value, Value, Value, None), COMMUTATIVE;
    Sub               => "sub",                (Value, Value, Value, None), 0;
    Mul               => "mul",                (Value, Value, Value, None), COMMUTATIVE;
    MulHi             => "mul_hi",             (Value, Value, Value, None), COMMUTATIVE;
    Div               => "div",                (Value, Value, Value, None), 0;
    MulAdd            => "mul_add",            (Value, Value, Value, Value), 0;
    Neg               => "neg",                (Value, Value, None, None), 0;
    And               => "and",                (Value, Value, Value, None), COMMUTATIVE;
    Or                => "or",                 (Value, Value, Value, None), COMMUTATIVE;
    Xor               => "xor",                (Value, Value, Value, None), COMMUTATIVE;
    Not               => "not",                (Value, Value, None, None), 0;
    Shl               => "shl",                (Value, Value, Value, None), 0;
    Shr               => "shr",                (Value, Value, Value, None), 0;
    Sha               => "sha",                (Value, Value, Value, None), 0;
    RotateLeft        => "rotate_left",        (Value, Value, Value, None), 0;
    ByteSwap          => "byte_swap",          (Value, Value, None, None), 0;
    CountLeadingZeros => "cntlz",              (Value, Value, None, None), 0;
    Insert            => "insert",             (Value, Value, Value, Value), 0;
    Extract           => "extract",            (Value, Value, Value, None), 0;
    Splat             => "splat",              (Value, Value, None, None), 0;
    Permute           => "permute",            (Value, Value, Value, Value), 0;
    Swizzle           => "swizzle",            (Value, Value, Offset, None), 0;
    VectorAdd         => "vector_add",         (Value, Value, Value, None), COMMUTATIVE;
    VectorSub         => "vector_sub",         (Value, Value, Value, None), 0;
    AtomicCompareExchange => "atomic_compare_exchange", (Value, Value, Value, Value), MEMORY | VOLATILE;
    AtomicAdd         => "atomic_add",         (Value, Value, Value, None), MEMORY | VOLATILE;
    AtomicSub         => "atomic_sub",         (Value, Value, Value, None), MEMORY | VOLATILE;
}

/// Per-instruction flag bits (meaning depends on the opcode).
pub mod instr_flags {
    /// Memory load observes acquire ordering.
    pub const LOAD_ACQUIRE: u16 = 1 << 0;
    /// Memory store observes release ordering.
    pub const STORE_RELEASE: u16 = 1 << 0;
    /// Call does not return to the emitted code (tail transfer).
    pub const CALL_TAIL: u16 = 1 << 1;
    /// Arithmetic treats operands as unsigned.
    pub const ARITHMETIC_UNSIGNED: u16 = 1 << 2;
    /// Branch is statically predicted taken.
    pub const BRANCH_LIKELY: u16 = 1 << 3;
}

/// One operand slot of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Value(ValueId),
    Label(LabelId),
    Offset(u64),
}

impl Operand {
    pub fn shape(self) -> OperandShape {
        match self {
            Operand::None => OperandShape::None,
            Operand::Value(_) => OperandShape::Value,
            Operand::Label(_) => OperandShape::Label,
            Operand::Offset(_) => OperandShape::Offset,
        }
    }

    pub fn as_value(self) -> Option<ValueId> {
        match self {
            Operand::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_label(self) -> Option<LabelId> {
        match self {
            Operand::Label(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_offset(self) -> Option<u64> {
        match self {
            Operand::Offset(o) => Some(o),
            _ => None,
        }
    }
}

/// Handle into the builder's instruction arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub(crate) u32);

impl InstrId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One IR operation, threaded into exactly one block's instruction list.
#[derive(Debug, Clone)]
pub struct Instr {
    pub opcode: Opcode,
    /// Opcode-specific modifier bits (see [`instr_flags`]); vector opcodes
    /// carry their lane part-type here.
    pub flags: u16,
    pub dest: Option<ValueId>,
    pub srcs: [Operand; 3],
    pub block: BlockId,
    pub prev: Option<InstrId>,
    pub next: Option<InstrId>,
}

impl Instr {
    pub fn is_branch(&self) -> bool {
        self.opcode.info().flags & opcode_flags::BRANCH != 0
    }

    pub fn src1_value(&self) -> Option<ValueId> {
        self.srcs[0].as_value()
    }

    pub fn src2_value(&self) -> Option<ValueId> {
        self.srcs[1].as_value()
    }

    pub fn src3_value(&self) -> Option<ValueId> {
        self.srcs[2].as_value()
    }
}
