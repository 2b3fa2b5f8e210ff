//! Site layouts of outer and partner molecules.
//!
//! A neighbor-list index names the first of `sites` consecutive particles.
//! Plain particles carry both interactions. Three-site water puts van der
//! Waals on the oxygen only and charges on all three sites. Four-site water
//! puts van der Waals on site 0 and charges on sites 1–3.

use crate::config::GeometryKind;

/// Most sites any layout has.
pub const MAX_SITES: usize = 4;

/// Which sites of a molecule carry which interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteLayout {
    pub sites: usize,
    pub vdw: [bool; MAX_SITES],
    pub charged: [bool; MAX_SITES],
}

pub const PARTICLE: SiteLayout = SiteLayout {
    sites: 1,
    vdw: [true, false, false, false],
    charged: [true, false, false, false],
};

pub const WATER3: SiteLayout = SiteLayout {
    sites: 3,
    vdw: [true, false, false, false],
    charged: [true, true, true, false],
};

pub const WATER4: SiteLayout = SiteLayout {
    sites: 4,
    vdw: [true, false, false, false],
    charged: [false, true, true, true],
};

impl GeometryKind {
    /// Outer and partner layouts.
    pub fn layouts(self) -> (SiteLayout, SiteLayout) {
        match self {
            Self::ParticleParticle => (PARTICLE, PARTICLE),
            Self::Water3Particle => (WATER3, PARTICLE),
            Self::Water3Water3 => (WATER3, WATER3),
            Self::Water4Particle => (WATER4, PARTICLE),
            Self::Water4Water4 => (WATER4, WATER4),
        }
    }

    /// Consecutive particles per outer index.
    pub fn i_sites(self) -> usize {
        self.layouts().0.sites
    }

    /// Consecutive particles per partner index.
    pub fn j_sites(self) -> usize {
        self.layouts().1.sites
    }
}

/// Which site pairs interact electrostatically and through van der Waals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitePair {
    pub elec: bool,
    pub vdw: bool,
}

impl SitePair {
    pub fn any(self) -> bool {
        self.elec || self.vdw
    }
}

/// Interaction flags of site pair `(a, b)` given which models are active.
#[inline]
pub const fn site_pair(
    i: &SiteLayout,
    j: &SiteLayout,
    a: usize,
    b: usize,
    elec_active: bool,
    vdw_active: bool,
) -> SitePair {
    SitePair {
        elec: elec_active && i.charged[a] && j.charged[b],
        vdw: vdw_active && i.vdw[a] && j.vdw[b],
    }
}

/// A compile-time site layout pair.
pub trait Geometry: Send + Sync + 'static {
    const KIND: GeometryKind;
    const I: SiteLayout;
    const J: SiteLayout;
}

macro_rules! geometry {
    ($(#[$doc:meta])* $name:ident, $kind:ident, $i:ident, $j:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Geometry for $name {
            const KIND: GeometryKind = GeometryKind::$kind;
            const I: SiteLayout = $i;
            const J: SiteLayout = $j;
        }
    };
}

geometry!(
    /// Particle against particle.
    ParticleParticle, ParticleParticle, PARTICLE, PARTICLE
);
geometry!(
    /// Three-site water against particle.
    Water3Particle, Water3Particle, WATER3, PARTICLE
);
geometry!(
    /// Three-site water against three-site water.
    Water3Water3, Water3Water3, WATER3, WATER3
);
geometry!(
    /// Four-site water against particle.
    Water4Particle, Water4Particle, WATER4, PARTICLE
);
geometry!(
    /// Four-site water against four-site water.
    Water4Water4, Water4Water4, WATER4, WATER4
);
