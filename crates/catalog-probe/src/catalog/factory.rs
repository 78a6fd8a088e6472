//! Deterministic sample products.

use super::model::{Category, Price, Product};

const CATALOG: [(&str, Category); 12] = [
    ("Hat", Category::Cloths),
    ("Pants", Category::Cloths),
    ("Shirt", Category::Cloths),
    ("Apple", Category::Food),
    ("Banana", Category::Food),
    ("Pots", Category::Housewares),
    ("Towels", Category::Housewares),
    ("Ford", Category::Automotive),
    ("Chevy", Category::Automotive),
    ("Hammer", Category::Tools),
    ("Wrench", Category::Tools),
    ("Widget", Category::Unknown),
];

/// Produces a repeatable sequence of sample products from a seed
#[derive(Debug, Clone)]
pub struct ProductFactory {
    state: u64,
    sequence: u64,
}

impl Default for ProductFactory {
    fn default() -> Self {
        Self::new(0x5EED)
    }
}

impl ProductFactory {
    /// Factory seeded with `seed`
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed,
            sequence: 0,
        }
    }

    // splitmix64
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Next sample product, without an id
    pub fn product(&mut self) -> Product {
        self.sequence += 1;
        let (name, category) = CATALOG[(self.next_u64() % CATALOG.len() as u64) as usize];
        let cents = 50 + self.next_u64() % 99_950;
        let available = self.next_u64() % 2 == 0;
        Product {
            id: None,
            name: name.to_string(),
            description: format!("Sample {} #{}", name.to_lowercase(), self.sequence),
            price: Price::from_cents(cents),
            available,
            category,
        }
    }

    /// `count` sample products
    pub fn batch(&mut self, count: usize) -> Vec<Product> {
        (0..count).map(|_| self.product()).collect()
    }
}

impl Iterator for ProductFactory {
    type Item = Product;

    fn next(&mut self) -> Option<Product> {
        Some(self.product())
    }
}
