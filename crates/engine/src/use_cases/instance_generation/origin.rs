//! Origin resolution from the first participant to enter an instance.

use delve_domain::{InstanceOrigin, WorldPosition};

use super::signal::ParticipantPosition;
use crate::infrastructure::ports::{GroundProbe, AIR_BLOCK};

/// Resolves an instance origin from a participant position.
///
/// x and z round to the nearest block, y floors. The block directly under the
/// participant decides whether the base already exists: if it is solid, the
/// origin sits on that block and no base is placed. The vertical offset is
/// applied last.
#[derive(Debug, Clone, Copy)]
pub struct OriginResolver {
    vertical_offset: i32,
}

impl OriginResolver {
    pub fn new(vertical_offset: i32) -> Self {
        Self { vertical_offset }
    }

    pub fn vertical_offset(&self) -> i32 {
        self.vertical_offset
    }

    pub fn resolve(&self, position: ParticipantPosition, ground: &dyn GroundProbe) -> InstanceOrigin {
        let x = (position.x + 0.5).floor() as i32;
        let z = (position.z + 0.5).floor() as i32;
        let standing_y = position.y.floor() as i32;
        let below = standing_y - 1;

        let (probe_x, probe_z) = (position.x.floor() as i32, position.z.floor() as i32);
        let base_present = match ground.block_at(probe_x, below, probe_z) {
            Ok(block) => block != AIR_BLOCK,
            Err(e) => {
                tracing::warn!(
                    x = probe_x,
                    y = below,
                    z = probe_z,
                    error = %e,
                    "Ground probe failed, assuming no base"
                );
                false
            }
        };

        let y = if base_present { below } else { standing_y };
        InstanceOrigin::new(
            WorldPosition::new(x, y + self.vertical_offset, z),
            base_present,
        )
    }
}
