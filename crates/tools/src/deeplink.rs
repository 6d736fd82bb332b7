//! Deep-link URL construction for map directions.
//!
//! Pure string building: given a provider, travel mode, and two place
//! names, produce the provider's public directions URL with both
//! endpoints percent-encoded. No network access, no state.

use urlencoding::encode;

/// Supported map providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapProvider {
    /// Baidu Maps (map.baidu.com).
    Baidu,
    /// Gaode / AutoNavi Maps (amap.com).
    Gaode,
}

impl MapProvider {
    /// Lowercase identifier used in config and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            MapProvider::Baidu => "baidu",
            MapProvider::Gaode => "gaode",
        }
    }
}

impl std::fmt::Display for MapProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MapProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baidu" => Ok(MapProvider::Baidu),
            "gaode" => Ok(MapProvider::Gaode),
            other => Err(format!("unknown map provider: {other}")),
        }
    }
}

/// Travel mode for a directions request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    /// Route by car.
    Driving,
    /// Route on foot.
    Walking,
}

impl TravelMode {
    /// Mode flag in Baidu's `mode=` query parameter.
    pub fn baidu_flag(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
        }
    }

    /// Mode flag in Gaode's `type=` query parameter.
    pub fn gaode_flag(&self) -> &'static str {
        match self {
            TravelMode::Driving => "car",
            TravelMode::Walking => "walk",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.baidu_flag())
    }
}

impl std::str::FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driving" => Ok(TravelMode::Driving),
            "walking" => Ok(TravelMode::Walking),
            other => Err(format!("unknown travel mode: {other}")),
        }
    }
}

/// Builds the provider-specific directions deep link for a route from
/// `start` to `end`.
///
/// Both place names are arbitrary user-supplied strings (spaces, CJK,
/// punctuation) and are component-escaped before embedding. Empty input
/// still yields a syntactically valid URL; whether the place exists is
/// the provider's problem.
///
/// Baidu's `sn=2`/`en=2` hints select the nearest matching point for
/// each endpoint so the site does not ask for manual disambiguation.
pub fn directions_url(provider: MapProvider, mode: TravelMode, start: &str, end: &str) -> String {
    let s = encode(start);
    let e = encode(end);
    match provider {
        MapProvider::Baidu => format!(
            "https://map.baidu.com/dir/{s}/{e}/@13520000,3570000,12z\
             ?querytype=nav&c=340\
             &sn=2$$$$$$${s}$$$$$$\
             &en=2$$$$$$${e}$$$$$$\
             &sq={s}&eq={e}&mode={}&route_traffic=1",
            mode.baidu_flag()
        ),
        MapProvider::Gaode => format!(
            "https://www.amap.com/dir?from%5Bname%5D={s}&to%5Bname%5D={e}&type={}&policy=1",
            mode.gaode_flag()
        ),
    }
}
