use serde::Serialize;

/// Distribution of one counter over order-of-magnitude bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandStats {
    pub zero: u64,
    /// 1 to 9
    pub ones: u64,
    /// 10 to 99
    pub tens: u64,
    /// 100 to 999
    pub hundreds: u64,
    /// 1000 to 9999
    pub thousands: u64,
    /// 10000 and up
    pub ten_thousands: u64,
    /// Sum of every value added.
    pub sum: u64,
}

impl BandStats {
    pub fn add(&mut self, value: u64) {
        self.sum = self.sum.saturating_add(value);
        let band = match value {
            0 => &mut self.zero,
            1..=9 => &mut self.ones,
            10..=99 => &mut self.tens,
            100..=999 => &mut self.hundreds,
            1000..=9999 => &mut self.thousands,
            _ => &mut self.ten_thousands,
        };
        *band += 1;
    }

    fn columns(&self) -> [u64; 7] {
        [
            self.zero,
            self.ones,
            self.tens,
            self.hundreds,
            self.thousands,
            self.ten_thousands,
            self.sum,
        ]
    }
}

/// Band statistics of every counter in a scrape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeStats {
    pub seeders: BandStats,
    pub downloaded: BandStats,
    pub leechers: BandStats,
    pub entries: u64,
}

impl ScrapeStats {
    /// Tab-separated seeders, downloaded and leechers bands, then the entry
    /// count.
    pub fn to_row(&self) -> String {
        let mut cols: Vec<String> = [self.seeders, self.downloaded, self.leechers]
            .iter()
            .flat_map(|b| b.columns())
            .map(|n| n.to_string())
            .collect();
        cols.push(self.entries.to_string());
        cols.join("\t")
    }
}
