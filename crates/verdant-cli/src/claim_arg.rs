//! `--claim` argument syntax: `<biome>@<x>,<y>,<z>..<x>,<y>,<z>`.

use std::str::FromStr;

use verdant_region::{BlockPos, Cuboid};

/// A biome claim given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimArg {
    pub biome: String,
    pub bounds: Cuboid,
}

/// A malformed `--claim` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid claim {input:?}: {reason} (expected <biome>@x,y,z..x,y,z)")]
pub struct ClaimArgError {
    input: String,
    reason: &'static str,
}

fn parse_pos(text: &str) -> Option<BlockPos> {
    let mut parts = text.split(',').map(|p| p.trim().parse::<i32>());
    let (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    Some(BlockPos::new(x, y, z))
}

impl FromStr for ClaimArg {
    type Err = ClaimArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| ClaimArgError {
            input: s.to_string(),
            reason,
        };
        let (biome, range) = s.split_once('@').ok_or_else(|| fail("missing '@'"))?;
        if biome.trim().is_empty() {
            return Err(fail("empty biome"));
        }
        let (a, b) = range.split_once("..").ok_or_else(|| fail("missing '..'"))?;
        let a = parse_pos(a).ok_or_else(|| fail("bad first corner"))?;
        let b = parse_pos(b).ok_or_else(|| fail("bad second corner"))?;
        Ok(Self {
            biome: biome.trim().to_string(),
            bounds: Cuboid::new(a, b),
        })
    }
}
