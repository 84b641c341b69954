//! Status-command side channel: a dispatcher-less radio arms a command by
//! sending a status update whose value matches a configured code, then
//! names the target with a call alert.

/// Configured status code values. A zero code disables that command.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCodes {
    pub check: u8,
    pub inhibit: u8,
    pub uninhibit: u8,
    pub force_reg: u8,
    pub force_dereg: u8,
}

impl StatusCodes {
    fn matches(&self, value: u8) -> bool {
        value != 0
            && ((self.check != 0 && value == self.check)
                || (self.inhibit != 0 && value == self.inhibit)
                || (self.uninhibit != 0 && value == self.uninhibit)
                || (self.force_reg != 0 && value == self.force_reg)
                || (self.force_dereg != 0 && value == self.force_dereg))
    }
}

/// What an armed command resolves to once the call alert names a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Check { src_id: u32, dst_id: u32 },
    Inhibit { dst_id: u32 },
    Uninhibit { dst_id: u32 },
    ForceReg { src_id: u32, dst_id: u32 },
    ForceDereg { src_id: u32 },
    /// Armed value no longer matches any configured code.
    Unhandled,
}

/// Outcome of offering a call alert to the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusConsume {
    /// Consumed: execute the action, ack, and drop the call alert.
    Action(StatusAction),
    /// Armed, but the call alert came from a different unit: drop it.
    WrongSrc,
    /// Nothing armed; handle the call alert normally.
    NotArmed,
}

pub struct StatusCommand {
    enabled: bool,
    codes: StatusCodes,
    src_id: u32,
    value: u8,
}

impl StatusCommand {
    pub fn new(enabled: bool, codes: StatusCodes) -> Self {
        StatusCommand { enabled, codes, src_id: 0, value: 0 }
    }

    pub fn is_armed(&self) -> bool {
        self.enabled && self.value != 0
    }

    /// Nothing recorded at all; distinct from armed because a zero-valued
    /// status update records its source without arming a command.
    pub fn is_idle(&self) -> bool {
        self.src_id == 0 && self.value == 0
    }

    pub fn armed_src(&self) -> u32 {
        self.src_id
    }

    /// Feed a received status update. Arms when the value matches a
    /// configured code, disarms otherwise.
    pub fn preprocess(&mut self, src_id: u32, value: u8) {
        if !self.enabled {
            return;
        }

        self.src_id = src_id;
        self.value = value;

        if value != 0 {
            if self.codes.matches(value) {
                tracing::info!(
                    "P25 TSDU, STS_UPDT (Status Update), command mode, status = ${:02X}, srcId = {}",
                    value, src_id);
            } else {
                self.disarm();
            }
        }
    }

    /// Offer a call alert to the armed command.
    pub fn consume(&mut self, src_id: u32, dst_id: u32) -> StatusConsume {
        if !self.is_armed() {
            return StatusConsume::NotArmed;
        }

        if self.src_id != src_id {
            tracing::warn!(
                "P25 TSDU, STS_UPDT (Status Update), illegal attempt by srcId = {} to access status command",
                src_id);
            self.disarm();
            return StatusConsume::WrongSrc;
        }

        let value = self.value;
        let action = if self.codes.check != 0 && value == self.codes.check {
            StatusAction::Check { src_id, dst_id }
        } else if self.codes.inhibit != 0 && value == self.codes.inhibit {
            StatusAction::Inhibit { dst_id }
        } else if self.codes.uninhibit != 0 && value == self.codes.uninhibit {
            StatusAction::Uninhibit { dst_id }
        } else if self.codes.force_reg != 0 && value == self.codes.force_reg {
            StatusAction::ForceReg { src_id, dst_id }
        } else if self.codes.force_dereg != 0 && value == self.codes.force_dereg {
            StatusAction::ForceDereg { src_id }
        } else {
            tracing::error!(
                "P25 TSDU, unhandled command mode, status = ${:02X}, srcId = {}, dstId = {}",
                value, src_id, dst_id);
            StatusAction::Unhandled
        };

        self.disarm();
        StatusConsume::Action(action)
    }

    /// Disarm without action.
    pub fn disarm(&mut self) {
        if self.enabled && self.src_id != 0 && self.value != 0 {
            tracing::info!(
                "P25 TSDU, STS_UPDT (Status Update), canceled command mode, status = ${:02X}",
                self.value);
        }
        self.src_id = 0;
        self.value = 0;
    }

    /// Any TSBK that is neither a call alert nor an extended function
    /// disarms a pending command.
    pub fn disarm_unless(&mut self, is_call_alrt_or_ext_fnct: bool) {
        if self.enabled && !is_call_alrt_or_ext_fnct {
            self.disarm();
        }
    }
}
