//! Per-category educational texts attached to detection results.

use serde::Serialize;

use crate::category::DisposalCategory;

/// Tip shown for items with no curated guidance.
const GENERIC_TIP: &str = "Dispose properly in appropriate bin.";

/// Educational metadata returned with each detected item.
#[derive(Clone, Debug, Serialize)]
pub struct ItemMetadata {
    pub transformation: String,
    pub impact: String,
    pub fun_fact: String,
    pub recycling_tips: String,
}

struct KnowledgeEntry {
    transformation: &'static str,
    impact: &'static str,
    fun_fact: &'static str,
    tip: &'static str,
}

const RECYCLABLE_ENTRY: KnowledgeEntry = KnowledgeEntry {
    transformation: "Sorted at a Material Recovery Facility and sold as raw manufacturing feedstock for new products.",
    impact: "Every item you recycle moves us one step closer to a zero-waste future and preserves natural habitats.",
    fun_fact: "This item is primarily dry waste. If cleaned properly, it has high value in the circular economy.",
    tip: "This item can be recycled. Clean it and place in the blue recycling bin. Common recyclables include paper, plastic bottles, and metal cans.",
};

const ORGANIC_ENTRY: KnowledgeEntry = KnowledgeEntry {
    transformation: "Undergoes aerobic decomposition to become fertilizer, or anaerobic digestion to generate bio-gas.",
    impact: "Organic recycling reduces the need for chemical fertilizers and helps soil retain more moisture.",
    fun_fact: "Organic matter is the 'battery' of the earth, storing nutrients that must be returned to the soil.",
    tip: "This is organic waste. Place it in the green compost bin. Organic waste includes food scraps, garden waste, and biodegradable materials.",
};

const REUSABLE_ENTRY: KnowledgeEntry = KnowledgeEntry {
    transformation: "Working items are refurbished and passed on; only worn-out parts enter the recycling stream.",
    impact: "Extending an item's life avoids the energy cost of manufacturing a replacement.",
    fun_fact: "Many everyday items like containers, bags, and clothing can serve for years beyond their first use.",
    tip: "This item can be reused. Consider repurposing it before disposal. Many items like containers, bags, and clothing can have a second life.",
};

const HAZARDOUS_ENTRY: KnowledgeEntry = KnowledgeEntry {
    transformation: "Chemically neutralized or safely encapsulated in specialized facilities to prevent environmental leakage.",
    impact: "Proper handling keeps toxins out of the human food chain, the soil, and the water supply.",
    fun_fact: "Hazardous waste accounts for only 1% of total waste but causes 90% of toxic contamination issues.",
    tip: "Take this to a dedicated hazardous-waste collection point. Never place it in a regular trash or recycling bin.",
};

const LANDFILL_ENTRY: KnowledgeEntry = KnowledgeEntry {
    transformation: "Compacted and permanently stored; some facilities convert it into electricity through incineration.",
    impact: "Reducing landfill waste saves cities millions in management costs and prevents land degradation.",
    fun_fact: "Landfill space is a finite resource. Modern landfills are engineered with liners and gas capture systems.",
    tip: GENERIC_TIP,
};

/// Knowledge table keyed by disposal category. Built once, shared read-only.
pub struct KnowledgeBase;

impl KnowledgeBase {
    pub fn new() -> Self {
        Self
    }

    /// Metadata for a category. Total over the category set; the landfill
    /// entry doubles as the fallback for items with no curated guidance.
    pub fn metadata(&self, category: DisposalCategory) -> ItemMetadata {
        let entry = match category {
            DisposalCategory::Recyclable => &RECYCLABLE_ENTRY,
            DisposalCategory::Organic => &ORGANIC_ENTRY,
            DisposalCategory::Reusable => &REUSABLE_ENTRY,
            DisposalCategory::Hazardous => &HAZARDOUS_ENTRY,
            DisposalCategory::Landfill => &LANDFILL_ENTRY,
        };
        ItemMetadata {
            transformation: entry.transformation.to_string(),
            impact: entry.impact.to_string(),
            fun_fact: entry.fun_fact.to_string(),
            recycling_tips: entry.tip.to_string(),
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_complete_metadata() {
        let kb = KnowledgeBase::new();
        for category in [
            DisposalCategory::Recyclable,
            DisposalCategory::Organic,
            DisposalCategory::Reusable,
            DisposalCategory::Hazardous,
            DisposalCategory::Landfill,
        ] {
            let meta = kb.metadata(category);
            assert!(!meta.transformation.is_empty());
            assert!(!meta.impact.is_empty());
            assert!(!meta.fun_fact.is_empty());
            assert!(!meta.recycling_tips.is_empty());
        }
    }

    #[test]
    fn reusable_and_recyclable_carry_distinct_tips() {
        let kb = KnowledgeBase::new();
        let recyclable = kb.metadata(DisposalCategory::Recyclable);
        let reusable = kb.metadata(DisposalCategory::Reusable);
        assert_ne!(recyclable.recycling_tips, reusable.recycling_tips);
    }

    #[test]
    fn landfill_tip_is_the_generic_fallback() {
        let kb = KnowledgeBase::new();
        let meta = kb.metadata(DisposalCategory::Landfill);
        assert_eq!(meta.recycling_tips, GENERIC_TIP);
    }
}
