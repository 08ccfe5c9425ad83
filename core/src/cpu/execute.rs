//! Per-instruction execution effects (spec.md §4.5, §4.7).
//!
//! Pulled out of [`super::Cpu`] so the state machine in `mod.rs` stays a
//! thin dispatcher: this module only computes outcomes, it never owns CPU
//! state.

use crate::alu::{Alu, AluOp};
use crate::bus::{BusRequest, BusResponse, BusTarget};
use crate::csr::{CsrBus, CsrOp};
use crate::decode::{self, Instr};
use tracing::warn;

/// Result of one EXECUTE-state tick.
pub enum Outcome {
    /// The instruction retired this tick.
    Complete { next_pc: u32, writeback: Option<(u8, u32)> },
    /// A load/store is still waiting on bus ack; call again next tick with
    /// the same latched operands.
    WaitMem,
    /// EBREAK: PC holds forever.
    Halt,
}

fn complete(next_pc: u32) -> Outcome {
    Outcome::Complete { next_pc, writeback: None }
}

fn complete_wb(next_pc: u32, rd: u8, value: u32) -> Outcome {
    Outcome::Complete { next_pc, writeback: Some((rd, value)) }
}

pub fn step(
    instr: &Instr,
    pc: u32,
    rs1_val: u32,
    rs2_val: u32,
    bus: &mut dyn BusTarget,
    csr: &mut CsrBus,
    strict_diagnostics: bool,
) -> Outcome {
    let pc_plus_4 = pc.wrapping_add(4);
    match *instr {
        Instr::Lui { rd, imm } => complete_wb(pc_plus_4, rd, imm as u32),
        Instr::Auipc { rd, imm } => {
            complete_wb(pc_plus_4, rd, Alu::eval(AluOp::Add, pc, imm as u32, 0))
        }
        Instr::Jal { rd, imm } => {
            complete_wb(Alu::eval(AluOp::Add, pc, imm as u32, 0), rd, pc_plus_4)
        }
        Instr::Jalr { rd, imm, .. } => {
            let target = Alu::eval(AluOp::Add, rs1_val, imm as u32, 0) & !1;
            complete_wb(target, rd, pc_plus_4)
        }
        Instr::Branch { funct3, imm, .. } => {
            let taken = branch_taken(funct3, rs1_val, rs2_val);
            let next = if taken { Alu::eval(AluOp::Add, pc, imm as u32, 0) } else { pc_plus_4 };
            complete(next)
        }
        Instr::Load { rd, funct3, imm, .. } => execute_load(rd, rs1_val, imm, funct3, pc_plus_4, bus),
        Instr::Store { funct3, imm, .. } => {
            execute_store(rs1_val, rs2_val, imm, funct3, pc_plus_4, bus)
        }
        Instr::OpImm { rd, funct3, imm, alt, .. } => {
            let out = alu_op_imm(funct3, alt, rs1_val, imm);
            complete_wb(pc_plus_4, rd, out)
        }
        Instr::Op { rd, funct3, alt, .. } => {
            let out = alu_op_reg(funct3, alt, rs1_val, rs2_val);
            complete_wb(pc_plus_4, rd, out)
        }
        Instr::Ecall => complete(pc_plus_4),
        Instr::Ebreak => Outcome::Halt,
        Instr::Csr { rd, rs1, funct3, csr_addr } => {
            execute_csr(rd, rs1, rs1_val, funct3, csr_addr, pc_plus_4, csr, strict_diagnostics)
        }
        Instr::Invalid(_) => complete(pc_plus_4),
    }
}

fn branch_taken(funct3: u8, rs1: u32, rs2: u32) -> bool {
    use decode::branch_funct3::*;
    match funct3 {
        BEQ => Alu::eval(AluOp::Eq, rs1, rs2, 0) != 0,
        BNE => Alu::eval(AluOp::Eq, rs1, rs2, 0) == 0,
        BLT => Alu::eval(AluOp::Lt, rs1, rs2, 0) != 0,
        BGE => Alu::eval(AluOp::Lt, rs1, rs2, 0) == 0,
        BLTU => Alu::eval(AluOp::Ltu, rs1, rs2, 0) != 0,
        BGEU => Alu::eval(AluOp::Ltu, rs1, rs2, 0) == 0,
        _ => false,
    }
}

fn alu_op_imm(funct3: u8, alt: bool, rs1: u32, imm: i32) -> u32 {
    use decode::alu_funct3::*;
    let imm_u = imm as u32;
    match funct3 {
        ADD_SUB => Alu::eval(AluOp::Add, rs1, imm_u, 0),
        SLL => Alu::eval(AluOp::ShiftLl, rs1, 0, imm_u),
        SLT => Alu::eval(AluOp::Lt, rs1, imm_u, 0),
        SLTU => Alu::eval(AluOp::Ltu, rs1, imm_u, 0),
        XOR => Alu::eval(AluOp::Xor, rs1, imm_u, 0),
        SR => {
            let op = if alt { AluOp::ShiftRa } else { AluOp::ShiftRl };
            Alu::eval(op, rs1, 0, imm_u)
        }
        OR => Alu::eval(AluOp::Or, rs1, imm_u, 0),
        AND => Alu::eval(AluOp::And, rs1, imm_u, 0),
        _ => 0,
    }
}

fn alu_op_reg(funct3: u8, alt: bool, rs1: u32, rs2: u32) -> u32 {
    use decode::alu_funct3::*;
    match funct3 {
        ADD_SUB => {
            let op = if alt { AluOp::Sub } else { AluOp::Add };
            Alu::eval(op, rs1, rs2, 0)
        }
        SLL => Alu::eval(AluOp::ShiftLl, rs1, 0, rs2),
        SLT => Alu::eval(AluOp::Lt, rs1, rs2, 0),
        SLTU => Alu::eval(AluOp::Ltu, rs1, rs2, 0),
        XOR => Alu::eval(AluOp::Xor, rs1, rs2, 0),
        SR => {
            let op = if alt { AluOp::ShiftRa } else { AluOp::ShiftRl };
            Alu::eval(op, rs1, 0, rs2)
        }
        OR => Alu::eval(AluOp::Or, rs1, rs2, 0),
        AND => Alu::eval(AluOp::And, rs1, rs2, 0),
        _ => 0,
    }
}

/// Byte offset within the addressed word, and the bus word address.
fn split_addr(byte_addr: u32) -> (u32, u32) {
    (byte_addr >> 2, byte_addr & 0b11)
}

fn execute_load(
    rd: u8,
    rs1_val: u32,
    imm: i32,
    funct3: u8,
    next_pc: u32,
    bus: &mut dyn BusTarget,
) -> Outcome {
    use crate::bus::SEL_WORD;
    use decode::mem_funct3::*;

    let byte_addr = Alu::eval(AluOp::Add, rs1_val, imm as u32, 0);
    let (word_adr, a) = split_addr(byte_addr);
    let req = BusRequest { adr: word_adr, dat_w: 0, sel: SEL_WORD, cyc: true, stb: true, we: false };
    let BusResponse { dat_r, ack } = bus.step(req);
    if !ack {
        return Outcome::WaitMem;
    }

    let (shift_bytes, width_bytes, signed) = match funct3 {
        BYTE => (a, 1u32, true),
        BYTE_U => (a, 1u32, false),
        HALF => (a & 0b10, 2u32, true),
        HALF_U => (a & 0b10, 2u32, false),
        WORD => (0, 4u32, true),
        _ => {
            warn!(funct3, "invalid load width, treating as word");
            (0, 4u32, true)
        }
    };
    let shifted = dat_r >> (shift_bytes * 8);
    let value = if width_bytes == 4 {
        shifted
    } else {
        let mask = (1u32 << (width_bytes * 8)) - 1;
        let raw = shifted & mask;
        if signed {
            let sign_bit = 1u32 << (width_bytes * 8 - 1);
            if raw & sign_bit != 0 { raw | !mask } else { raw }
        } else {
            raw
        }
    };
    complete_wb(next_pc, rd, value)
}

fn execute_store(
    rs1_val: u32,
    rs2_val: u32,
    imm: i32,
    funct3: u8,
    next_pc: u32,
    bus: &mut dyn BusTarget,
) -> Outcome {
    use crate::bus::{SEL_BYTE0, SEL_HALF, SEL_WORD};
    use decode::mem_funct3::{BYTE, HALF, WORD};

    let byte_addr = Alu::eval(AluOp::Add, rs1_val, imm as u32, 0);
    let (word_adr, a) = split_addr(byte_addr);

    let (dat_w, sel) = match funct3 {
        BYTE => {
            let b = rs2_val & 0xff;
            (b | (b << 8) | (b << 16) | (b << 24), SEL_BYTE0 << a)
        }
        HALF => {
            let h = rs2_val & 0xffff;
            (h | (h << 16), SEL_HALF << (a & 0b10))
        }
        WORD => (rs2_val, SEL_WORD),
        _ => {
            warn!(funct3, "invalid store width, treating as word");
            (rs2_val, SEL_WORD)
        }
    };

    let req = BusRequest { adr: word_adr, dat_w, sel, cyc: true, stb: true, we: true };
    let BusResponse { ack, .. } = bus.step(req);
    if !ack {
        return Outcome::WaitMem;
    }
    complete(next_pc)
}

fn execute_csr(
    rd: u8,
    rs1_field: u8,
    rs1_val: u32,
    funct3: u8,
    csr_addr: u16,
    next_pc: u32,
    csr: &mut CsrBus,
    strict_diagnostics: bool,
) -> Outcome {
    use decode::sys_funct3::*;

    if csr.peek(csr_addr).is_none() {
        warn!(csr_addr, "CSR address claimed by no provider, treating access as no-op");
        assert!(
            !strict_diagnostics,
            "strict diagnostics: CSR address {csr_addr:#x} claimed by no provider"
        );
        return complete(next_pc);
    }

    let uimm = rs1_field as u32;
    let (op, mut suppress_write, suppress_read) = match funct3 {
        CSRRW => (CsrOp::Write(rs1_val), false, rd == 0),
        CSRRS => (CsrOp::Set(rs1_val), rs1_field == 0, false),
        CSRRC => (CsrOp::Clear(rs1_val), rs1_field == 0, false),
        CSRRWI => (CsrOp::Write(uimm), false, rd == 0),
        CSRRSI => (CsrOp::Set(uimm), uimm == 0, false),
        CSRRCI => (CsrOp::Clear(uimm), uimm == 0, false),
        _ => return complete(next_pc),
    };

    if !suppress_write && csr.is_read_only(csr_addr).unwrap_or(false) {
        warn!(csr_addr, "write attempted to a read-only CSR, treating as no-op");
        assert!(
            !strict_diagnostics,
            "strict diagnostics: write attempted to read-only CSR {csr_addr:#x}"
        );
        suppress_write = true;
    }

    let before = csr.access(csr_addr, op, suppress_write);
    if suppress_read {
        complete(next_pc)
    } else {
        complete_wb(next_pc, rd, before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ram::Ram;
    use crate::csr::counters::Counters;

    fn csr_bus() -> CsrBus {
        CsrBus::new(vec![Box::new(Counters::new())]).unwrap()
    }

    #[test]
    fn jalr_clears_lsb_even_when_target_odd() {
        let mut ram = Ram::new(4);
        let mut csr = csr_bus();
        let outcome = step(
            &Instr::Jalr { rd: 1, rs1: 2, imm: 3 },
            0x100,
            0x1000,
            0,
            &mut ram,
            &mut csr,
            false,
        );
        match outcome {
            Outcome::Complete { next_pc, writeback } => {
                assert_eq!(next_pc, 0x1002); // 0x1000+3=0x1003, lsb cleared
                assert_eq!(writeback, Some((1, 0x104)));
            }
            _ => panic!("expected Complete"),
        }
    }

    #[test]
    fn load_byte_sign_extends() {
        let mut ram = Ram::new(4);
        let mut csr = csr_bus();
        // preload ram word 0 with 0xF8D63412 so byte 2 = 0xD6 (negative as i8)
        ram.step(BusRequest { adr: 0, dat_w: 0xF8D6_3412, sel: 0b1111, cyc: true, stb: true, we: true });
        ram.step(BusRequest { adr: 0, dat_w: 0xF8D6_3412, sel: 0b1111, cyc: true, stb: true, we: true });

        let outcome = loop {
            let o = execute_load(10, 2, 0, decode::mem_funct3::BYTE, 4, &mut ram);
            if let Outcome::Complete { .. } = o {
                break o;
            }
        };
        match outcome {
            Outcome::Complete { writeback, .. } => assert_eq!(writeback, Some((10, 0xFFFF_FFD6))),
            _ => unreachable!(),
        }
    }

    #[test]
    fn store_byte_then_load_word_preserves_other_bytes() {
        let mut ram = Ram::new(4);
        let store = loop {
            let o = execute_store(0, 0x78, 2, decode::mem_funct3::BYTE, 4, &mut ram);
            if let Outcome::Complete { .. } = o {
                break o;
            }
        };
        assert!(matches!(store, Outcome::Complete { .. }));

        let load = loop {
            let o = execute_load(5, 0, 0, decode::mem_funct3::WORD, 8, &mut ram);
            if let Outcome::Complete { .. } = o {
                break o;
            }
        };
        match load {
            Outcome::Complete { writeback, .. } => {
                assert_eq!(writeback, Some((5, 0x0078_0000)));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn csrrs_with_x0_source_does_not_write() {
        let mut csr = csr_bus();
        let outcome =
            execute_csr(5, 0, 0xffff_ffff, decode::sys_funct3::CSRRS, crate::csr::counters::CYCLE_LO, 4, &mut csr, false);
        assert!(matches!(outcome, Outcome::Complete { .. }));
        assert_eq!(csr.peek(crate::csr::counters::CYCLE_LO), Some(0));
    }

    #[test]
    fn csrrw_with_rd_x0_suppresses_writeback() {
        let mut csr = csr_bus();
        let outcome =
            execute_csr(0, 1, 99, decode::sys_funct3::CSRRW, crate::csr::counters::CYCLE_LO, 4, &mut csr, false);
        match outcome {
            Outcome::Complete { writeback, .. } => assert_eq!(writeback, None),
            _ => panic!(),
        }
    }

    #[test]
    fn csrrw_to_read_only_counter_logs_and_does_not_write() {
        let mut csr = csr_bus();
        let outcome =
            execute_csr(1, 2, 0xdead, decode::sys_funct3::CSRRW, crate::csr::counters::CYCLE_LO, 4, &mut csr, false);
        assert!(matches!(outcome, Outcome::Complete { .. }));
        assert_eq!(csr.peek(crate::csr::counters::CYCLE_LO), Some(0));
    }

    #[test]
    #[should_panic(expected = "strict diagnostics")]
    fn strict_diagnostics_panics_on_write_to_read_only_csr() {
        let mut csr = csr_bus();
        execute_csr(1, 2, 0xdead, decode::sys_funct3::CSRRW, crate::csr::counters::CYCLE_LO, 4, &mut csr, true);
    }

    #[test]
    #[should_panic(expected = "strict diagnostics")]
    fn strict_diagnostics_panics_on_unclaimed_csr() {
        let mut csr = csr_bus();
        execute_csr(1, 0, 0, decode::sys_funct3::CSRRS, 0x999, 4, &mut csr, true);
    }
}
