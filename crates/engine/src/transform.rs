//! Context derivations applied by `execute` sub-commands.
//!
//! Forks select entities and produce one context per target. Redirects
//! compute a single value and produce exactly one context.

use mdcommand_core::DVec3;

use crate::args::Arguments;
use crate::context::{Anchor, ExecutionContext};
use crate::error::CommandResult;
use crate::server::CommandServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkTransform {
    /// Replace the acting entity.
    As,
    /// Take the target's dimension, position and rotation.
    At,
    /// Take the target's dimension and position.
    PositionedAs,
    RotatedAs,
    /// Rotate toward the target's anchored point.
    FacingEntity,
}

impl ForkTransform {
    pub fn apply(
        self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        args: &Arguments,
    ) -> CommandResult<Vec<ExecutionContext>> {
        let targets = server.select_entities(ctx, args.selector("targets")?)?;
        let anchor = match self {
            Self::FacingEntity => *args.anchor("anchor")?,
            _ => Anchor::Feet,
        };
        Ok(targets
            .into_iter()
            .map(|target| match self {
                Self::As => ctx.with_entity(target),
                Self::At => ctx
                    .with_dimension(target.dimension)
                    .with_position(target.position)
                    .with_rotation(target.rotation),
                Self::PositionedAs => ctx
                    .with_dimension(target.dimension)
                    .with_position(target.position),
                Self::RotatedAs => ctx.with_rotation(target.rotation),
                Self::FacingEntity => ctx.facing_entity(&target, anchor),
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTransform {
    /// Hand the context on unchanged.
    Run,
    /// New position; the anchor resets to feet.
    Positioned,
    Rotated,
    Facing,
    Anchored,
    /// Switch dimension, scaling x and z by the dimensions' coordinate scales.
    In,
    /// Floor the selected axes of the position.
    Align,
}

impl RedirectTransform {
    pub fn apply(self, ctx: &ExecutionContext, args: &Arguments) -> CommandResult<ExecutionContext> {
        Ok(match self {
            Self::Run => ctx.clone(),
            Self::Positioned => ctx
                .with_position(args.coordinates("pos")?.position(ctx))
                .with_anchor(Anchor::Feet),
            Self::Rotated => ctx.with_rotation(args.rotation("rot")?.resolve(ctx)),
            Self::Facing => ctx.facing(args.coordinates("pos")?.position(ctx)),
            Self::Anchored => ctx.with_anchor(*args.anchor("anchor")?),
            Self::In => {
                let dimension = *args.dimension("dimension")?;
                let scale = ctx.dimension().scale_to(dimension);
                let pos = ctx.position();
                ctx.with_dimension(dimension)
                    .with_position(DVec3::new(pos.x * scale, pos.y, pos.z * scale))
            }
            Self::Align => ctx.with_position(args.swizzle("axes")?.apply(ctx.position())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Argument;
    use crate::coords::{CoordArg, Coordinates, Swizzle};
    use mdcommand_core::{DimensionId, Rotation};

    fn console() -> ExecutionContext {
        ExecutionContext::console(DimensionId::Overworld, DVec3::new(16.0, 64.0, -8.0))
    }

    #[test]
    fn in_nether_divides_horizontal_position() {
        let mut args = Arguments::default();
        args.insert("dimension", Argument::Dimension(DimensionId::Nether));
        let moved = RedirectTransform::In.apply(&console(), &args).unwrap();
        assert_eq!(moved.dimension(), DimensionId::Nether);
        assert_eq!(moved.position(), DVec3::new(2.0, 64.0, -1.0));

        let mut back = Arguments::default();
        back.insert("dimension", Argument::Dimension(DimensionId::Overworld));
        let returned = RedirectTransform::In.apply(&moved, &back).unwrap();
        assert_eq!(returned.position(), DVec3::new(16.0, 64.0, -8.0));
    }

    #[test]
    fn positioned_resets_anchor() {
        let mut args = Arguments::default();
        args.insert(
            "pos",
            Argument::Coordinates(Coordinates::World {
                x: CoordArg::Relative(1.0),
                y: CoordArg::Absolute(0.0),
                z: CoordArg::Relative(0.0),
            }),
        );
        let ctx = console().with_anchor(Anchor::Eyes);
        let moved = RedirectTransform::Positioned.apply(&ctx, &args).unwrap();
        assert_eq!(moved.position(), DVec3::new(17.0, 0.0, -8.0));
        assert_eq!(moved.anchor(), Anchor::Feet);
        assert_eq!(ctx.anchor(), Anchor::Eyes);
    }

    #[test]
    fn align_floors_selected_axes() {
        let mut args = Arguments::default();
        args.insert(
            "axes",
            Argument::Swizzle(Swizzle {
                x: true,
                y: false,
                z: true,
            }),
        );
        let ctx = console().with_position(DVec3::new(-1.25, 70.5, 3.75));
        let aligned = RedirectTransform::Align.apply(&ctx, &args).unwrap();
        assert_eq!(aligned.position(), DVec3::new(-2.0, 70.5, 3.0));
    }

    #[test]
    fn run_is_identity_and_missing_args_fail() {
        let ctx = console().with_rotation(Rotation::new(10.0, 20.0));
        let same = RedirectTransform::Run.apply(&ctx, &Arguments::default()).unwrap();
        assert_eq!(same.rotation(), ctx.rotation());
        assert_eq!(same.position(), ctx.position());
        assert!(RedirectTransform::Rotated
            .apply(&ctx, &Arguments::default())
            .is_err());
    }
}
