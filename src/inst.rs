use crate::{error::TraceError, reservation_station::StationId};
use std::{fmt, str::FromStr};
use strum::{Display, EnumIter};

/// Program-order index of an instruction in the trace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tag(pub usize);

impl From<usize> for Tag {
    fn from(i: usize) -> Self {
        Tag(i)
    }
}

impl From<Tag> for usize {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Floating point architectural register index (`F<n>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FpReg(pub usize);

impl fmt::Display for FpReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Raw address component of a load or store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Imm(pub i64);

pub type Cycle = u64;

/// Functional unit category. Also the prefix of every station name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum FuType {
    Load,
    Store,
    #[strum(serialize = "Add")]
    AddSub,
    #[strum(serialize = "Mult")]
    MultDiv,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Inst {
    Add(FpReg, FpReg, FpReg),
    Sub(FpReg, FpReg, FpReg),
    Mult(FpReg, FpReg, FpReg),
    Div(FpReg, FpReg, FpReg),
    Load(FpReg, Imm, Imm),
    // The register holds the value being stored, it is not written.
    Store(FpReg, Imm, Imm),
}

/// Operand slot of a reservation station: either resolved, or waiting on the
/// station that will broadcast it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueOrTag {
    Valid,
    Invalid(StationId),
}

impl ValueOrTag {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValueOrTag::Valid)
    }

    pub fn waits_on(&self, id: StationId) -> bool {
        *self == ValueOrTag::Invalid(id)
    }
}

impl Inst {
    pub fn fu_type(&self) -> FuType {
        match self {
            Inst::Add(..) | Inst::Sub(..) => FuType::AddSub,
            Inst::Mult(..) | Inst::Div(..) => FuType::MultDiv,
            Inst::Load(..) => FuType::Load,
            Inst::Store(..) => FuType::Store,
        }
    }

    pub fn latency(&self) -> u32 {
        match self {
            Inst::Add(..) | Inst::Sub(..) | Inst::Load(..) | Inst::Store(..) => 2,
            Inst::Mult(..) => 10,
            Inst::Div(..) => 40,
        }
    }

    /// Register this instruction renames, if any.
    pub fn dest_reg(&self) -> Option<FpReg> {
        match *self {
            Inst::Add(dst, _, _)
            | Inst::Sub(dst, _, _)
            | Inst::Mult(dst, _, _)
            | Inst::Div(dst, _, _)
            | Inst::Load(dst, _, _) => Some(dst),
            Inst::Store(..) => None,
        }
    }

    pub fn src_regs(&self) -> Vec<FpReg> {
        match *self {
            Inst::Add(_, src1, src2)
            | Inst::Sub(_, src1, src2)
            | Inst::Mult(_, src1, src2)
            | Inst::Div(_, src1, src2) => vec![src1, src2],
            Inst::Load(..) => vec![],
            Inst::Store(src, _, _) => vec![src],
        }
    }

    pub fn regs(&self) -> impl Iterator<Item = FpReg> {
        self.dest_reg().into_iter().chain(self.src_regs())
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Inst::Add(..) => "ADD",
            Inst::Sub(..) => "SUB",
            Inst::Mult(..) => "MULT",
            Inst::Div(..) => "DIV",
            Inst::Load(..) => "LOAD",
            Inst::Store(..) => "STORE",
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Inst::Add(a, b, c) | Inst::Sub(a, b, c) | Inst::Mult(a, b, c) | Inst::Div(a, b, c) => {
                write!(f, "{} {a} {b} {c}", self.mnemonic())
            }
            Inst::Load(r, base, off) | Inst::Store(r, base, off) => {
                write!(f, "{} {r} {} {}", self.mnemonic(), base.0, off.0)
            }
        }
    }
}

/// Cycle timestamps of one instruction. Each field is set at most once.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct InstStatus {
    pub issued: Option<Cycle>,
    pub completed: Option<Cycle>,
    pub write_result: Option<Cycle>,
}

/// Which timestamp of an [`InstStatus`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(serialize = "issue")]
    Issue,
    #[strum(serialize = "completion")]
    Complete,
    #[strum(serialize = "write-result")]
    WriteResult,
}

impl InstStatus {
    fn set_once(slot: &mut Option<Cycle>, cycle: Cycle) -> Result<(), Cycle> {
        match *slot {
            Some(old) => Err(old),
            None => {
                *slot = Some(cycle);
                Ok(())
            }
        }
    }

    /// Records `cycle` for `stage`, returning the already recorded cycle on
    /// a second attempt.
    pub fn mark(&mut self, stage: Stage, cycle: Cycle) -> Result<(), Cycle> {
        let slot = match stage {
            Stage::Issue => &mut self.issued,
            Stage::Complete => &mut self.completed,
            Stage::WriteResult => &mut self.write_result,
        };
        Self::set_once(slot, cycle)
    }

    pub fn is_retired(&self) -> bool {
        self.write_result.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstRecord {
    pub tag: Tag,
    pub inst: Inst,
    pub status: InstStatus,
}

impl InstRecord {
    pub fn new(tag: Tag, inst: Inst) -> Self {
        Self {
            tag,
            inst,
            status: InstStatus::default(),
        }
    }
}

impl FromStr for Inst {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let op = fields.next().ok_or(TraceError::Empty)?;
        let args = fields.collect::<Vec<_>>();
        if args.len() != 3 {
            return Err(TraceError::ArgCount {
                op: op.to_owned(),
                found: args.len(),
            });
        }

        let reg_arg = |n: usize| FpReg::from_str(args[n]);
        let imm_arg = |n: usize| Imm::from_str(args[n]);

        let inst = match op.to_lowercase().as_str() {
            "add" => Inst::Add(reg_arg(0)?, reg_arg(1)?, reg_arg(2)?),
            "sub" => Inst::Sub(reg_arg(0)?, reg_arg(1)?, reg_arg(2)?),
            "mult" => Inst::Mult(reg_arg(0)?, reg_arg(1)?, reg_arg(2)?),
            "div" => Inst::Div(reg_arg(0)?, reg_arg(1)?, reg_arg(2)?),
            "load" => Inst::Load(reg_arg(0)?, imm_arg(1)?, imm_arg(2)?),
            "store" => Inst::Store(reg_arg(0)?, imm_arg(1)?, imm_arg(2)?),
            _ => return Err(TraceError::UnknownOp(op.to_owned())),
        };

        Ok(inst)
    }
}

impl FromStr for FpReg {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(['F', 'f'])
            .and_then(|n| n.parse::<usize>().ok())
            .map(FpReg)
            .ok_or_else(|| TraceError::BadRegister(s.to_owned()))
    }
}

impl FromStr for Imm {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = if let Some(hex) = s.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(hex) = s.strip_prefix("-0x") {
            i64::from_str_radix(hex, 16).map(|v| -v)
        } else {
            i64::from_str(s)
        };

        val.map(Imm)
            .map_err(|_| TraceError::BadImmediate(s.to_owned()))
    }
}
