use crate::types::Location;

/// Linear map from a population domain onto a radius range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl RadiusScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    /// Domain `[0, max population]` over exactly `locations`.
    pub fn for_locations(locations: &[Location], min_radius: f64, max_radius: f64) -> Self {
        let max_population = locations.iter().map(|l| l.population).max().unwrap_or(0);
        Self::new([0.0, max_population as f64], [min_radius, max_radius])
    }

    pub fn domain_max(&self) -> f64 {
        self.domain[1]
    }

    pub fn apply(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        // A collapsed domain puts everything at the middle of the range.
        let t = if d1 != d0 { (value - d0) / (d1 - d0) } else { 0.5 };
        r0 + t * (r1 - r0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn town(name: &str, population: u64) -> Location {
        Location {
            name: name.to_string(),
            latitude: 52.0,
            longitude: -1.0,
            population,
        }
    }

    #[test]
    fn endpoints_map_to_radius_bounds() {
        let towns = [town("A", 0), town("B", 100)];
        let scale = RadiusScale::for_locations(&towns, 5.0, 10.0);
        assert_relative_eq!(scale.apply(0.0), 5.0);
        assert_relative_eq!(scale.apply(100.0), 10.0);
        assert_relative_eq!(scale.apply(50.0), 7.5);
    }

    #[test]
    fn monotonic_in_population() {
        let towns: Vec<_> = (0..20).map(|i| town("t", i * 997)).collect();
        let scale = RadiusScale::for_locations(&towns, 5.0, 10.0);
        let radii: Vec<f64> = towns.iter().map(|t| scale.apply(t.population as f64)).collect();
        assert!(radii.windows(2).all(|w| w[0] <= w[1]));
        assert_relative_eq!(*radii.last().unwrap(), 10.0);
    }

    #[test]
    fn domain_follows_the_given_set() {
        let first = RadiusScale::for_locations(&[town("A", 1_000)], 5.0, 10.0);
        let second = RadiusScale::for_locations(&[town("B", 40)], 5.0, 10.0);
        assert_eq!(first.domain_max(), 1_000.0);
        assert_eq!(second.domain_max(), 40.0);
        assert_relative_eq!(second.apply(40.0), 10.0);
    }

    #[test]
    fn collapsed_domain_uses_range_midpoint() {
        let scale = RadiusScale::for_locations(&[town("A", 0), town("B", 0)], 5.0, 10.0);
        assert_relative_eq!(scale.apply(0.0), 7.5);
        let empty = RadiusScale::for_locations(&[], 5.0, 10.0);
        assert_eq!(empty.domain_max(), 0.0);
    }
}
