//! # UI Packet Composer
//!
//! Drains the UI element stack into at most one outbound frame per
//! invocation.
//!
//! Priority order: a pending deletion always goes first and is never batched
//! (stale on-screen elements must disappear promptly), then graphics, then
//! one string. Graphics are batched at the smallest wire tier that covers the
//! pending count among {1, 2, 5, 7}, capped at 7 per frame; slots the tier
//! leaves unfilled are transmitted zeroed and the frame declares the tier's
//! nominal size.

use crate::referee::encoder::{ComposedPacket, PacketAssembler};
use crate::referee::protocol::{
    SUB_CMD_UI_DELETE, SUB_CMD_UI_DRAW1, SUB_CMD_UI_DRAW2, SUB_CMD_UI_DRAW5, SUB_CMD_UI_DRAW7,
    SUB_CMD_UI_STRING,
};

use super::element::GRAPHIC_WIRE_SIZE;
use super::stack::UiStack;

/// Graphic batch sizes the wire format defines, smallest first
pub const GRAPHIC_BATCH_TIERS: [usize; 4] = [1, 2, 5, 7];

/// Smallest wire tier covering `pending` graphics, capped at the largest tier
fn batch_tier(pending: usize) -> usize {
    GRAPHIC_BATCH_TIERS
        .iter()
        .copied()
        .find(|&tier| tier >= pending)
        .unwrap_or(GRAPHIC_BATCH_TIERS[GRAPHIC_BATCH_TIERS.len() - 1])
}

fn tier_sub_cmd(tier: usize) -> u16 {
    match tier {
        1 => SUB_CMD_UI_DRAW1,
        2 => SUB_CMD_UI_DRAW2,
        5 => SUB_CMD_UI_DRAW5,
        _ => SUB_CMD_UI_DRAW7,
    }
}

/// Composes outbound UI frames from the pending element stack
///
/// Owns the frame assembler (and with it the outbound sequence counter); one
/// instance per link.
#[derive(Debug, Default)]
pub struct PacketComposer {
    assembler: PacketAssembler,
}

impl PacketComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce at most one outbound frame from the stack
    ///
    /// # Arguments
    ///
    /// * `stack` - Pending UI operations; popped entries are consumed
    /// * `robot_id` - Own robot identifier for the sender/receiver sub-header
    ///
    /// # Returns
    ///
    /// * `Option<ComposedPacket>` - One frame, or `None` when nothing is
    ///   pending
    pub fn compose(&mut self, stack: &mut UiStack, robot_id: u8) -> Option<ComposedPacket> {
        if let Some(delete) = stack.pop_delete() {
            return Some(self.assembler.assemble(
                SUB_CMD_UI_DELETE,
                robot_id,
                &delete.encode(),
            ));
        }

        let pending = stack.graphic_len();
        if pending > 0 {
            let tier = batch_tier(pending);
            let mut content = vec![0u8; tier * GRAPHIC_WIRE_SIZE];
            let mut filled = 0;
            while filled < tier {
                let Some(element) = stack.pop_graphic() else {
                    break;
                };
                let at = filled * GRAPHIC_WIRE_SIZE;
                content[at..at + GRAPHIC_WIRE_SIZE].copy_from_slice(&element.encode());
                filled += 1;
            }
            return Some(self.assembler.assemble(tier_sub_cmd(tier), robot_id, &content));
        }

        if let Some(string) = stack.pop_string() {
            return Some(self.assembler.assemble(
                SUB_CMD_UI_STRING,
                robot_id,
                &string.encode(),
            ));
        }

        None
    }
}
