use crate::{Arity, Category, Opcode, Primitive};
use mep_core::random_provider;
use mep_error::{MepError, MepResult, mep_err};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
struct WSymbol {
    primitive: Arc<Primitive>,
    opcode: Opcode,
    weight: u32,
}

/// The default weight assigned to a symbol when the caller does not specify one.
pub const BASE_WEIGHT: u32 = 100;

/// A weighted roulette over a fixed set of symbols. Kept sorted by descending weight (purely
/// to make `roulette` converge faster on skewed weight distributions; selection itself is
/// still a uniform draw over the cumulative weight, not position-dependent).
#[derive(Clone, Default)]
struct SumContainer {
    elems: Vec<WSymbol>,
    sum: u32,
}

impl SumContainer {
    fn insert(&mut self, sym: WSymbol) {
        self.sum += sym.weight;
        let pos = self
            .elems
            .partition_point(|existing| existing.weight >= sym.weight);
        self.elems.insert(pos, sym);
    }

    fn len(&self) -> usize {
        self.elems.len()
    }

    fn roulette(&self) -> Option<&Primitive> {
        if self.elems.is_empty() || self.sum == 0 {
            return None;
        }
        let mut pick = random_provider::range(0..self.sum);
        for elem in &self.elems {
            if pick < elem.weight {
                return Some(&elem.primitive);
            }
            pick -= elem.weight;
        }
        self.elems.last().map(|e| e.primitive.as_ref())
    }
}

#[derive(Clone, Default)]
struct CategoryView {
    all: SumContainer,
    functions: SumContainer,
    terminals: SumContainer,
}

impl CategoryView {
    fn insert(&mut self, sym: WSymbol) {
        if sym.primitive.is_terminal() {
            self.terminals.insert(sym.clone());
        } else {
            self.functions.insert(sym.clone());
        }
        self.all.insert(sym);
    }
}

/// Categorized, weighted registry of primitives. Owns every [`Primitive`]; per-category views
/// hold non-owning `Arc` clones: an owning symbol vector plus, per category, `all`/`functions`/
/// `terminals` sub-views, with a category-agnostic aggregate view kept alongside them.
pub struct SymbolSet {
    symbols: Vec<Arc<Primitive>>,
    by_name: HashMap<&'static str, usize>,
    views: Vec<CategoryView>,
    aggregate: CategoryView,
}

impl SymbolSet {
    pub fn new(categories: u16) -> Self {
        SymbolSet {
            symbols: Vec::new(),
            by_name: HashMap::new(),
            views: (0..categories).map(|_| CategoryView::default()).collect(),
            aggregate: CategoryView::default(),
        }
    }

    pub fn categories(&self) -> u16 {
        self.views.len() as u16
    }

    pub fn insert(&mut self, primitive: Primitive, weight: u32) -> MepResult<Opcode> {
        let category = primitive.category();
        if category.0 as usize >= self.views.len() {
            return Err(mep_err!(
                InvalidConfig: "primitive {} declares category {} but only {} categories exist",
                primitive.name(), category.0, self.views.len()
            ));
        }

        let opcode = Opcode(self.symbols.len() as u32);
        let arc = Arc::new(primitive);
        self.by_name.insert(arc.name(), self.symbols.len());
        self.symbols.push(arc.clone());

        let sym = WSymbol {
            primitive: arc,
            opcode,
            weight,
        };
        self.views[category.0 as usize].insert(sym.clone());
        self.aggregate.insert(sym);

        Ok(opcode)
    }

    pub fn insert_default(&mut self, primitive: Primitive) -> MepResult<Opcode> {
        self.insert(primitive, BASE_WEIGHT)
    }

    /// Equal prior for function-vs-terminal: flips a fair coin, then draws proportionally to
    /// weight within whichever subset won the flip. Prevents terminal flooding when terminals
    /// vastly outnumber functions, falling back to whichever subset is non-empty if the other is.
    pub fn roulette(&self, category: Category) -> Option<&Primitive> {
        let view = self.view(category)?;
        let want_function = random_provider::bool(0.5);
        match (want_function, view.functions.len(), view.terminals.len()) {
            (true, 0, _) => view.terminals.roulette(),
            (true, _, _) => view.functions.roulette(),
            (false, _, 0) => view.functions.roulette(),
            (false, _, _) => view.terminals.roulette(),
        }
    }

    /// Draws proportionally to weight across every primitive of the category, functions and
    /// terminals alike, with no function-vs-terminal bias.
    pub fn roulette_free(&self, category: Category) -> Option<&Primitive> {
        self.view(category)?.all.roulette()
    }

    pub fn roulette_function(&self, category: Category) -> Option<&Primitive> {
        self.view(category)?.functions.roulette()
    }

    pub fn roulette_terminal(&self, category: Category) -> Option<&Primitive> {
        self.view(category)?.terminals.roulette()
    }

    pub fn decode_opcode(&self, opcode: Opcode) -> Option<&Primitive> {
        self.symbols.get(opcode.0 as usize).map(|p| p.as_ref())
    }

    pub fn decode_name(&self, name: &str) -> Option<&Primitive> {
        self.by_name.get(name).map(|&i| self.symbols[i].as_ref())
    }

    /// The opcode a primitive was assigned at [`SymbolSet::insert`] time. `by_name` indices are
    /// dense and assigned in the same order as `symbols`, so this is a direct lookup rather than
    /// a scan.
    pub fn opcode_of(&self, name: &str) -> Option<Opcode> {
        self.by_name.get(name).map(|&i| Opcode(i as u32))
    }

    pub fn terminals(&self, category: Category) -> usize {
        self.view(category).map(|v| v.terminals.len()).unwrap_or(0)
    }

    pub fn functions(&self, category: Category) -> usize {
        self.view(category).map(|v| v.functions.len()).unwrap_or(0)
    }

    pub fn weight(&self, opcode: Opcode) -> Option<u32> {
        self.aggregate
            .all
            .elems
            .iter()
            .find(|e| e.opcode == opcode)
            .map(|e| e.weight)
    }

    pub fn enough_terminals(&self) -> bool {
        self.views.iter().all(|v| v.terminals.len() > 0)
    }

    pub fn is_valid(&self) -> bool {
        self.enough_terminals() && !self.symbols.is_empty()
    }

    pub fn validate(&self) -> MepResult<()> {
        if !self.enough_terminals() {
            return Err(mep_err!(
                InvalidConfig: "every category must own at least one terminal"
            ));
        }
        if self.symbols.is_empty() {
            return Err(mep_err!(InvalidConfig: "symbol set is empty"));
        }
        Ok(())
    }

    fn view(&self, category: Category) -> Option<&CategoryView> {
        self.views.get(category.0 as usize)
    }
}
