//! Bare-minimum RV32I assembler: just enough mnemonics to build the fixed
//! test programs in `vectors/` and the generator binary. Not a general
//! assembler — unsupported forms simply aren't provided.

use riscv32_core::decode::{alu_funct3, branch_funct3, mem_funct3, opcode};

pub fn lui(rd: u8, imm20: i32) -> u32 {
    opcode::LUI | ((rd as u32) << 7) | ((imm20 as u32) & 0xffff_f000)
}

pub fn ebreak() -> u32 {
    opcode::SYSTEM | (1 << 20)
}

fn i_type(op: u32, rd: u8, funct3: u8, rs1: u8, imm: i32) -> u32 {
    op | ((rd as u32) << 7) | ((funct3 as u32) << 12) | ((rs1 as u32) << 15) | (((imm as u32) & 0xfff) << 20)
}

pub fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(opcode::OP_IMM, rd, alu_funct3::ADD_SUB, rs1, imm)
}

pub fn lb(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(opcode::LOAD, rd, mem_funct3::BYTE, rs1, imm)
}

pub fn lw(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(opcode::LOAD, rd, mem_funct3::WORD, rs1, imm)
}

pub fn sb(rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    opcode::STORE
        | ((imm & 0x1f) << 7)
        | ((mem_funct3::BYTE as u32) << 12)
        | ((rs1 as u32) << 15)
        | ((rs2 as u32) << 20)
        | (((imm >> 5) & 0x7f) << 25)
}

fn r_type(op: u32, rd: u8, funct3: u8, rs1: u8, rs2: u8, alt: bool) -> u32 {
    let funct7 = if alt { 0b0100000 } else { 0b0000000 };
    op | ((rd as u32) << 7)
        | ((funct3 as u32) << 12)
        | ((rs1 as u32) << 15)
        | ((rs2 as u32) << 20)
        | (funct7 << 25)
}

pub fn add(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(opcode::OP, rd, alu_funct3::ADD_SUB, rs1, rs2, false)
}

pub fn slt(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(opcode::OP, rd, alu_funct3::SLT, rs1, rs2, false)
}

pub fn sltu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(opcode::OP, rd, alu_funct3::SLTU, rs1, rs2, false)
}

/// Branch relative to this instruction's own address, in bytes (must be
/// even; negative for a back-edge).
pub fn bne(rs1: u8, rs2: u8, imm: i32) -> u32 {
    let u = imm as u32;
    opcode::BRANCH
        | (((u >> 11) & 1) << 7)
        | (((u >> 1) & 0xf) << 8)
        | ((branch_funct3::BNE as u32) << 12)
        | ((rs1 as u32) << 15)
        | ((rs2 as u32) << 20)
        | (((u >> 5) & 0x3f) << 25)
        | (((u >> 12) & 1) << 31)
}

/// Assemble a sequence of words into a flat little-endian byte image.
pub fn image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bne_back_edge_decodes_to_negative_imm() {
        use riscv32_core::decode::{decode, Instr};
        let word = bne(1, 2, -4);
        match decode(word) {
            Instr::Branch { imm, .. } => assert_eq!(imm, -4),
            other => panic!("expected Branch, got {other:?}"),
        }
    }
}
