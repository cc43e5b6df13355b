//! Coordinate arguments: absolute, relative (`~`) and local (`^`).

use mdcommand_core::{BlockPos, DVec3, Rotation};

use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult};
use crate::reader::StringReader;

/// One axis of a world coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordArg {
    Absolute(f64),
    Relative(f64),
}

impl CoordArg {
    pub fn resolve(self, base: f64) -> f64 {
        match self {
            Self::Absolute(v) => v,
            Self::Relative(delta) => base + delta,
        }
    }

    fn is_relative(self) -> bool {
        matches!(self, Self::Relative(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    World { x: CoordArg, y: CoordArg, z: CoordArg },
    /// Offsets along the context's own axes.
    Local { left: f64, up: f64, forwards: f64 },
}

impl Coordinates {
    /// `x y z`. With `center_correct`, absolute whole-number x and z move to
    /// the centre of their block.
    pub fn parse_vec3(reader: &mut StringReader<'_>, center_correct: bool) -> CommandResult<Self> {
        if reader.peek() == Some('^') {
            return Self::parse_local(reader);
        }
        let x = parse_axis(reader, center_correct)?;
        reader.expect_separator()?;
        let y = parse_axis(reader, false)?;
        reader.expect_separator()?;
        let z = parse_axis(reader, center_correct)?;
        Ok(Self::World { x, y, z })
    }

    /// `x y z` where absolute values must be whole numbers.
    pub fn parse_block_pos(reader: &mut StringReader<'_>) -> CommandResult<Self> {
        if reader.peek() == Some('^') {
            return Self::parse_local(reader);
        }
        let x = parse_block_axis(reader)?;
        reader.expect_separator()?;
        let y = parse_block_axis(reader)?;
        reader.expect_separator()?;
        let z = parse_block_axis(reader)?;
        Ok(Self::World { x, y, z })
    }

    fn parse_local(reader: &mut StringReader<'_>) -> CommandResult<Self> {
        let left = parse_local_axis(reader)?;
        reader.expect_separator()?;
        let up = parse_local_axis(reader)?;
        reader.expect_separator()?;
        let forwards = parse_local_axis(reader)?;
        Ok(Self::Local { left, up, forwards })
    }

    pub fn is_relative(&self) -> bool {
        match self {
            Self::World { x, y, z } => x.is_relative() || y.is_relative() || z.is_relative(),
            Self::Local { .. } => true,
        }
    }

    /// Point in the context's frame.
    pub fn position(&self, ctx: &ExecutionContext) -> DVec3 {
        match *self {
            Self::World { x, y, z } => {
                let base = ctx.position();
                DVec3::new(x.resolve(base.x), y.resolve(base.y), z.resolve(base.z))
            }
            Self::Local { left, up, forwards } => {
                local_offset(ctx.anchored_position(), ctx.rotation(), left, up, forwards)
            }
        }
    }

    pub fn block_pos(&self, ctx: &ExecutionContext) -> BlockPos {
        BlockPos::containing(self.position(ctx))
    }
}

fn local_offset(origin: DVec3, rotation: Rotation, left: f64, up: f64, forwards: f64) -> DVec3 {
    let yaw = (f64::from(rotation.yaw) + 90.0).to_radians();
    let pitch = f64::from(-rotation.pitch).to_radians();
    let raised = f64::from(-rotation.pitch + 90.0).to_radians();
    let forwards_axis = DVec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
    let up_axis = DVec3::new(
        yaw.cos() * raised.cos(),
        raised.sin(),
        yaw.sin() * raised.cos(),
    );
    let left_axis = -forwards_axis.cross(up_axis);
    origin + forwards_axis * forwards + up_axis * up + left_axis * left
}

fn split_relative(reader: &mut StringReader<'_>, marker: char) -> bool {
    if reader.peek() == Some(marker) {
        reader.skip();
        true
    } else {
        false
    }
}

fn parse_axis(reader: &mut StringReader<'_>, center_correct: bool) -> CommandResult<CoordArg> {
    if reader.peek() == Some('^') {
        return Err(reader.error("cannot mix world and local coordinates"));
    }
    if split_relative(reader, '~') {
        let delta = if reader.at_boundary() {
            0.0
        } else {
            reader.read_double()?
        };
        return Ok(CoordArg::Relative(delta));
    }
    let start = reader.cursor();
    let value = reader.read_double()?;
    let whole = !reader.input()[start..reader.cursor()].contains('.');
    if center_correct && whole {
        return Ok(CoordArg::Absolute(value + 0.5));
    }
    Ok(CoordArg::Absolute(value))
}

fn parse_block_axis(reader: &mut StringReader<'_>) -> CommandResult<CoordArg> {
    if reader.peek() == Some('^') {
        return Err(reader.error("cannot mix world and local coordinates"));
    }
    if split_relative(reader, '~') {
        let delta = if reader.at_boundary() {
            0.0
        } else {
            reader.read_double()?
        };
        return Ok(CoordArg::Relative(delta));
    }
    Ok(CoordArg::Absolute(f64::from(reader.read_int()?)))
}

fn parse_local_axis(reader: &mut StringReader<'_>) -> CommandResult<f64> {
    if !split_relative(reader, '^') {
        return Err(reader.error("cannot mix world and local coordinates"));
    }
    if reader.at_boundary() {
        Ok(0.0)
    } else {
        reader.read_double()
    }
}

/// `yaw pitch`, each absolute or `~` relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationArg {
    pub yaw: CoordArg,
    pub pitch: CoordArg,
}

impl RotationArg {
    pub fn parse(reader: &mut StringReader<'_>) -> CommandResult<Self> {
        let yaw = parse_axis(reader, false)?;
        reader.expect_separator()?;
        let pitch = parse_axis(reader, false)?;
        Ok(Self { yaw, pitch })
    }

    pub fn resolve(&self, ctx: &ExecutionContext) -> Rotation {
        let current = ctx.rotation();
        Rotation::new(
            self.yaw.resolve(f64::from(current.yaw)) as f32,
            self.pitch.resolve(f64::from(current.pitch)) as f32,
        )
    }
}

/// Axis subset for `align`, e.g. `xz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Swizzle {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Swizzle {
    pub fn parse(reader: &mut StringReader<'_>) -> CommandResult<Self> {
        let start = reader.cursor();
        let token = reader.read_token();
        let mut swizzle = Self::default();
        for c in token.chars() {
            let axis = match c {
                'x' => &mut swizzle.x,
                'y' => &mut swizzle.y,
                'z' => &mut swizzle.z,
                _ => return Err(CommandError::syntax(format!("invalid swizzle '{token}'"), start)),
            };
            if *axis {
                return Err(CommandError::syntax(format!("invalid swizzle '{token}'"), start));
            }
            *axis = true;
        }
        if token.is_empty() {
            return Err(CommandError::syntax("expected a swizzle", start));
        }
        Ok(swizzle)
    }

    /// Floor the selected axes.
    pub fn apply(&self, pos: DVec3) -> DVec3 {
        DVec3::new(
            if self.x { pos.x.floor() } else { pos.x },
            if self.y { pos.y.floor() } else { pos.y },
            if self.z { pos.z.floor() } else { pos.z },
        )
    }
}
