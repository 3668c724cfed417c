//! Structural visitor - builds the scoped graph from a Python syntax tree
//!
//! Recursive descent over tree-sitter nodes. The current world and the edge
//! a finished expression should be wired into (a [`Slot`]) are passed down
//! explicitly; the only state kept between calls is the graph under
//! construction, the symbol table and the closure-proxy cache.
//!
//! Constructs outside the supported subset (comprehensions, lambdas,
//! unpacking, decorators, `async`, `with`, ...) are skipped with a `debug!`
//! line and never fail the parse.

use tracing::debug;
use tree_sitter::Node as TsNode;
use crate::adapter::python::{field_children, named_children, text, unwrap_parens};
use crate::edge::{Edge, EdgeKind};
use crate::graph::Graph;
use crate::id::{NodeId, WorldId};
use crate::node::{CallSite, Node, NodeData, Param, ParamKind, Variable};
use crate::scope::{ProxyCache, SymbolTable};

/// The edge a finished expression node is wired into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl Slot {
    pub fn new(target: &NodeId, kind: EdgeKind) -> Self {
        Self { target: target.clone(), kind }
    }
}

/// Graph builder for one parse
pub struct WorldVisitor<'s> {
    source: &'s str,
    graph: Graph,
    symbols: SymbolTable,
    proxies: ProxyCache,
}

impl<'s> WorldVisitor<'s> {
    /// Visitor for a whole module, starting from an empty root scope
    pub fn new(source: &'s str) -> Self {
        Self::with_state(source, SymbolTable::default(), ProxyCache::new())
    }

    /// Visitor whose symbol table and proxy cache were seeded elsewhere
    pub fn with_state(source: &'s str, symbols: SymbolTable, proxies: ProxyCache) -> Self {
        Self {
            source,
            graph: Graph::new(),
            symbols,
            proxies,
        }
    }

    /// Visit every top-level statement of a module into `world`
    pub fn visit_module(&mut self, module: TsNode, world: &WorldId) {
        self.visit_block(module, world);
    }

    /// Take the built graph
    pub fn finish(self) -> Graph {
        self.graph
    }

    fn text(&self, node: TsNode) -> &'s str {
        text(node, self.source)
    }

    fn add(&mut self, data: NodeData, label: impl Into<String>, world: &WorldId) -> NodeId {
        self.graph.add_node(Node::new(data, label, world.clone()))
    }

    fn connect(&mut self, source: &NodeId, slot: Option<&Slot>) {
        if let Some(slot) = slot {
            self.graph.add_edge(Edge::new(source.clone(), slot.target.clone(), slot.kind.clone()));
        }
    }

    /// Run `f` inside a fresh symbol scope
    fn in_scope<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.symbols.push_scope();
        f(self);
        self.symbols.pop_scope();
    }

    fn define(&mut self, name: &str, node: &NodeId, world: &WorldId) -> u32 {
        let version = self.symbols.define_write(name, node.clone(), world.clone());
        if let Some(Node { data: NodeData::Variable(var), .. }) = self.graph.node_mut(node) {
            var.version = version;
        }
        version
    }

    /// Seed a parameter-mode variable in the innermost scope
    fn seed_param(&mut self, name: &str, optional: bool, world: &WorldId) {
        let id = self.add(NodeData::Variable(Variable::param(optional)), name, world);
        self.define(name, &id, world);
    }

    // --- statements ---

    fn visit_block(&mut self, block: TsNode, world: &WorldId) {
        for statement in named_children(block) {
            self.visit_statement(statement, world);
        }
    }

    fn visit_statement(&mut self, stmt: TsNode, world: &WorldId) {
        match stmt.kind() {
            "expression_statement" => self.visit_expression_statement(stmt, world),
            "function_definition" => self.visit_function(stmt, world),
            "class_definition" => self.visit_class(stmt, world),
            "return_statement" => self.visit_return(stmt, world),
            "if_statement" => self.visit_if(stmt, world),
            "for_statement" => self.visit_for(stmt, world),
            "while_statement" => self.visit_while(stmt, world),
            "try_statement" => self.visit_try(stmt, world),
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                self.visit_import(stmt)
            }
            "pass_statement" | "break_statement" | "continue_statement" => {}
            other => debug!("Skipping unsupported statement `{}` at line {}", other, line(stmt)),
        }
    }

    fn visit_expression_statement(&mut self, stmt: TsNode, world: &WorldId) {
        let children = named_children(stmt);
        let [expr] = children.as_slice() else {
            debug!("Skipping tuple expression statement at line {}", line(stmt));
            return;
        };

        match expr.kind() {
            "assignment" => self.visit_assignment(*expr, world),
            "augmented_assignment" => self.visit_augmented_assignment(*expr, world),
            _ => {
                let expr = unwrap_parens(*expr);
                match expr.kind() {
                    "call" => self.visit_call(expr, world, None),
                    // docstrings
                    "string" | "concatenated_string" => {}
                    other => debug!("Skipping expression statement `{}` at line {}", other, line(expr)),
                }
            }
        }
    }

    /// Single simple-name target only
    fn simple_target(&self, node: TsNode) -> Option<&'s str> {
        let left = node.child_by_field_name("left")?;
        (left.kind() == "identifier").then(|| self.text(left))
    }

    fn visit_assignment(&mut self, node: TsNode, world: &WorldId) {
        let Some(right) = node.child_by_field_name("right") else {
            debug!("Skipping bare annotation at line {}", line(node));
            return;
        };
        let Some(name) = self.simple_target(node) else {
            debug!("Skipping unsupported assignment shape at line {}", line(node));
            return;
        };
        if right.kind() == "assignment" {
            debug!("Skipping chained assignment at line {}", line(node));
            return;
        }

        let var = self.add(NodeData::Variable(Variable::write(0)), name, world);
        // reads on the right-hand side still see the previous version
        self.visit_expr(right, world, Some(&Slot::new(&var, EdgeKind::WritesTo)));
        self.define(name, &var, world);
    }

    /// `x op= e` becomes a new write of `x` fed by `(x op e)`
    fn visit_augmented_assignment(&mut self, node: TsNode, world: &WorldId) {
        let (Some(name), Some(op), Some(right)) = (
            self.simple_target(node),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            debug!("Skipping unsupported augmented assignment at line {}", line(node));
            return;
        };

        let symbol = self.text(op).trim_end_matches('=');
        let var = self.add(NodeData::Variable(Variable::write(0)), name, world);
        let operator = self.add(NodeData::Operator { unary: false }, symbol, world);
        self.connect(&operator, Some(&Slot::new(&var, EdgeKind::WritesTo)));
        self.read_name(name, world, Some(&Slot::new(&operator, EdgeKind::Operand { index: 0 })));
        self.visit_expr(right, world, Some(&Slot::new(&operator, EdgeKind::Operand { index: 1 })));
        self.define(name, &var, world);
    }

    fn visit_function(&mut self, node: TsNode, world: &WorldId) {
        if node.child(0).is_some_and(|c| c.kind() == "async") {
            debug!("Skipping async def at line {}", line(node));
            return;
        }
        let (Some(name), Some(body)) = (node.child_by_field_name("name"), node.child_by_field_name("body")) else {
            return;
        };
        let name = self.text(name);
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.collect_params(p))
            .unwrap_or_default();

        let def = self.add(NodeData::FunctionDef { params: params.clone() }, name, world);
        self.symbols.define_write(name, def.clone(), world.clone());

        let inner = WorldId::Node(def);
        self.in_scope(|v| {
            for param in params.iter().filter(|p| !p.is_marker()) {
                v.seed_param(&param.name, param.optional, &inner);
            }
            v.visit_block(body, &inner);
        });
    }

    fn collect_params(&self, parameters: TsNode) -> Vec<Param> {
        named_children(parameters)
            .into_iter()
            .filter_map(|p| self.param_from(p))
            .collect()
    }

    fn param_from(&self, node: TsNode) -> Option<Param> {
        match node.kind() {
            "identifier" => Some(Param::required(self.text(node))),
            "typed_parameter" => named_children(node).first().and_then(|inner| self.param_from(*inner)),
            "default_parameter" | "typed_default_parameter" => {
                let name = node.child_by_field_name("name")?;
                let value = node.child_by_field_name("value")?;
                Some(Param::with_default(self.text(name), self.text(value)))
            }
            "list_splat_pattern" => {
                let name = named_children(node).first().map(|n| self.text(*n))?;
                Some(Param::variadic(name, ParamKind::VarArgs))
            }
            "dictionary_splat_pattern" => {
                let name = named_children(node).first().map(|n| self.text(*n))?;
                Some(Param::variadic(name, ParamKind::KwArgs))
            }
            "keyword_separator" => Some(Param::marker(ParamKind::KeywordOnly)),
            "positional_separator" => Some(Param::marker(ParamKind::PositionalOnly)),
            other => {
                debug!("Skipping parameter `{}` at line {}", other, line(node));
                None
            }
        }
    }

    fn visit_class(&mut self, node: TsNode, world: &WorldId) {
        let (Some(name), Some(body)) = (node.child_by_field_name("name"), node.child_by_field_name("body")) else {
            return;
        };
        let name = self.text(name);
        let bases = node
            .child_by_field_name("superclasses")
            .map(|list| named_children(list).iter().map(|b| self.text(*b).to_string()).collect())
            .unwrap_or_default();

        let class = self.add(NodeData::ClassDef { bases }, name, world);
        self.symbols.define_write(name, class.clone(), world.clone());

        let inner = WorldId::Node(class);
        self.in_scope(|v| v.visit_block(body, &inner));
    }

    fn visit_return(&mut self, node: TsNode, world: &WorldId) {
        let ret = self.add(NodeData::Return, "return", world);
        if let Some(value) = named_children(node).first() {
            self.visit_expr(*value, world, Some(&Slot::new(&ret, EdgeKind::Input)));
        }
    }

    /// Open a clause node's world and visit its body there
    fn visit_clause_body(&mut self, clause: &NodeId, body: Option<TsNode>) {
        let inner = WorldId::Node(clause.clone());
        if let Some(body) = body {
            self.in_scope(|v| v.visit_block(body, &inner));
        }
    }

    /// Create a test-guarded clause (`if`, `elif`, `while`)
    fn test_clause(&mut self, data: NodeData, keyword: &str, node: TsNode, world: &WorldId) -> NodeId {
        let condition = node.child_by_field_name("condition");
        let label = match condition {
            Some(c) => format!("{} {}", keyword, self.text(c)),
            None => keyword.to_string(),
        };
        let clause = self.add(data, label, world);
        if let Some(condition) = condition {
            self.visit_expr(condition, world, Some(&Slot::new(&clause, EdgeKind::Input)));
        }
        clause
    }

    fn visit_if(&mut self, node: TsNode, world: &WorldId) {
        let head = self.test_clause(NodeData::IfBlock, "if", node, world);
        self.visit_clause_body(&head, node.child_by_field_name("consequence"));

        let mut previous = head;
        for alternative in field_children(node, "alternative") {
            let clause = match alternative.kind() {
                "elif_clause" => {
                    let elif = self.test_clause(NodeData::ElifBlock, "elif", alternative, world);
                    self.visit_clause_body(&elif, alternative.child_by_field_name("consequence"));
                    elif
                }
                "else_clause" => {
                    let other = self.add(NodeData::ElseBlock, "else", world);
                    self.visit_clause_body(&other, alternative.child_by_field_name("body"));
                    other
                }
                _ => continue,
            };
            self.graph.add_edge(Edge::new(previous, clause.clone(), EdgeKind::NextClause { index: None }));
            previous = clause;
        }
    }

    fn visit_for(&mut self, node: TsNode, world: &WorldId) {
        if node.child(0).is_some_and(|c| c.kind() == "async") {
            debug!("Skipping async for at line {}", line(node));
            return;
        }
        let (Some(left), Some(right)) = (node.child_by_field_name("left"), node.child_by_field_name("right")) else {
            return;
        };
        if node.child_by_field_name("alternative").is_some() {
            debug!("Skipping for-else clause at line {}", line(node));
        }

        let target = self.text(left);
        let label = format!("for {} in {}", target, self.text(right));
        let block = self.add(NodeData::ForBlock { target: target.to_string() }, label, world);
        self.visit_expr(right, world, Some(&Slot::new(&block, EdgeKind::IteratesOn)));

        let inner = WorldId::Node(block);
        let names = target_names(left, self.source);
        let body = node.child_by_field_name("body");
        self.in_scope(|v| {
            for name in &names {
                v.seed_param(name, false, &inner);
            }
            if let Some(body) = body {
                v.visit_block(body, &inner);
            }
        });
    }

    fn visit_while(&mut self, node: TsNode, world: &WorldId) {
        if node.child_by_field_name("alternative").is_some() {
            debug!("Skipping while-else clause at line {}", line(node));
        }
        let block = self.test_clause(NodeData::WhileBlock, "while", node, world);
        self.visit_clause_body(&block, node.child_by_field_name("body"));
    }

    fn visit_try(&mut self, node: TsNode, world: &WorldId) {
        let block = self.add(NodeData::TryBlock, "try", world);
        self.visit_clause_body(&block, node.child_by_field_name("body"));

        let mut index = 0;
        for clause in named_children(node) {
            match clause.kind() {
                "except_clause" => {
                    self.visit_except(clause, world, &block, index);
                    index += 1;
                }
                "else_clause" | "finally_clause" | "except_group_clause" => {
                    debug!("Skipping `{}` of try at line {}", clause.kind(), line(clause))
                }
                _ => {}
            }
        }
    }

    fn visit_except(&mut self, clause: TsNode, world: &WorldId, try_block: &NodeId, index: usize) {
        let children = named_children(clause);
        let body = children.iter().rev().find(|c| c.kind() == "block").copied();
        let parts: Vec<TsNode> = children.into_iter().filter(|c| c.kind() != "block").collect();

        let (exception, binding) = match parts.first() {
            Some(first) if first.kind() == "as_pattern" => {
                let inner = named_children(*first);
                (inner.first().copied(), inner.get(1).map(|alias| self.text(*alias)))
            }
            first => (first.copied(), parts.get(1).map(|alias| self.text(*alias))),
        };

        let mut label = "except".to_string();
        if let Some(exception) = exception {
            label.push(' ');
            label.push_str(self.text(exception));
        }
        if let Some(binding) = binding {
            label.push_str(" as ");
            label.push_str(binding);
        }

        let data = NodeData::ExceptBlock {
            exception: exception.map(|e| self.text(e).to_string()),
            binding: binding.map(str::to_string),
        };
        let handler = self.add(data, label, world);
        self.graph.add_edge(Edge::new(
            try_block.clone(),
            handler.clone(),
            EdgeKind::NextClause { index: Some(index) },
        ));
        if let Some(exception) = exception {
            self.visit_expr(exception, world, Some(&Slot::new(&handler, EdgeKind::Input)));
        }

        let inner = WorldId::Node(handler);
        self.in_scope(|v| {
            if let Some(binding) = binding {
                v.seed_param(binding, false, &inner);
            }
            if let Some(body) = body {
                v.visit_block(body, &inner);
            }
        });
    }

    /// Imports live in the imports world; the names they bind are recorded
    /// in the current scope so later reads resolve to the import.
    fn visit_import(&mut self, node: TsNode) {
        let bindings = import_bindings(node, self.source);
        let import = self.add(
            NodeData::Import { bindings: bindings.clone() },
            self.text(node).trim(),
            &WorldId::Imports,
        );
        for name in &bindings {
            self.symbols.define_write(name, import.clone(), WorldId::Imports);
        }
    }

    // --- expressions ---

    fn visit_expr(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let expr = unwrap_parens(expr);
        match expr.kind() {
            "identifier" => self.read_name(self.text(expr), world, slot),
            "integer" | "float" | "string" | "concatenated_string" | "true" | "false" | "none" | "ellipsis" => {
                self.literal(self.text(expr), world, slot)
            }
            "unary_operator" => self.visit_unary(expr, world, slot),
            "not_operator" => {
                if let Some(argument) = expr.child_by_field_name("argument") {
                    self.unary("not", argument, world, slot);
                }
            }
            "binary_operator" | "boolean_operator" => {
                let (Some(left), Some(op), Some(right)) = (
                    expr.child_by_field_name("left"),
                    expr.child_by_field_name("operator"),
                    expr.child_by_field_name("right"),
                ) else {
                    return;
                };
                self.binary(self.text(op), left, right, world, slot);
            }
            "comparison_operator" => self.visit_comparison(expr, world, slot),
            "call" => self.visit_call(expr, world, slot),
            "attribute" => self.visit_attribute(expr, world, slot),
            "subscript" => self.visit_subscript(expr, world, slot),
            "list" => self.visit_list(expr, world, slot),
            "dictionary" => self.visit_dict(expr, world, slot),
            other => debug!("Skipping unsupported expression `{}` at line {}", other, line(expr)),
        }
    }

    /// Variable read; names with no binding are external and leave no edge
    fn read_name(&mut self, name: &str, world: &WorldId, slot: Option<&Slot>) {
        if slot.is_none() {
            return;
        }
        let Some(binding) = self.symbols.resolve_read(name).cloned() else {
            return;
        };

        let source = if &binding.world == world {
            binding.node
        } else if let Some(proxy) = self.proxies.get(world, &binding.node) {
            proxy.clone()
        } else {
            let proxy = self.add(
                NodeData::Variable(Variable::closure_read(binding.node.clone(), binding.world)),
                name,
                world,
            );
            self.graph.add_edge(Edge::new(binding.node.clone(), proxy.clone(), EdgeKind::ClosureOf));
            self.proxies.insert(world.clone(), binding.node, proxy.clone());
            proxy
        };
        self.connect(&source, slot);
    }

    /// Literals without a consumer are not recorded
    fn literal(&mut self, value: &str, world: &WorldId, slot: Option<&Slot>) {
        if slot.is_some() {
            let id = self.add(NodeData::Literal, value, world);
            self.connect(&id, slot);
        }
    }

    fn visit_unary(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let (Some(op), Some(argument)) = (expr.child_by_field_name("operator"), expr.child_by_field_name("argument")) else {
            return;
        };
        let op = self.text(op);
        if matches!(op, "-" | "+") && matches!(argument.kind(), "integer" | "float") {
            self.literal(self.text(expr), world, slot);
        } else {
            self.unary(op, argument, world, slot);
        }
    }

    fn unary(&mut self, op: &str, argument: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let id = self.add(NodeData::Operator { unary: true }, op, world);
        self.connect(&id, slot);
        self.visit_expr(argument, world, Some(&Slot::new(&id, EdgeKind::Operand { index: 0 })));
    }

    fn binary(&mut self, op: &str, left: TsNode, right: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let id = self.add(NodeData::Operator { unary: false }, op, world);
        self.connect(&id, slot);
        self.visit_expr(left, world, Some(&Slot::new(&id, EdgeKind::Operand { index: 0 })));
        self.visit_expr(right, world, Some(&Slot::new(&id, EdgeKind::Operand { index: 1 })));
    }

    fn visit_comparison(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let operands = named_children(expr);
        let [left, right] = operands.as_slice() else {
            debug!("Skipping chained comparison at line {}", line(expr));
            return;
        };
        let op = field_children(expr, "operators")
            .iter()
            .map(|o| self.text(*o))
            .collect::<Vec<_>>()
            .join(" ");
        self.binary(&op, *left, *right, world, slot);
    }

    fn visit_call(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let Some(function) = expr.child_by_field_name("function") else {
            return;
        };

        // a bare callee name is not a variable read
        let (label, receiver, site) = match function.kind() {
            "attribute" => match function.child_by_field_name("attribute") {
                Some(attr) => (self.text(attr), function.child_by_field_name("object"), CallSite::method()),
                None => (self.text(function), None, CallSite::function()),
            },
            _ => (self.text(function), None, CallSite::function()),
        };

        let call = self.add(NodeData::Call(site), label, world);
        self.connect(&call, slot);
        if let Some(receiver) = receiver {
            self.visit_expr(receiver, world, Some(&Slot::new(&call, EdgeKind::AttributeValue)));
        }

        let Some(arguments) = expr.child_by_field_name("arguments") else {
            return;
        };
        if arguments.kind() != "argument_list" {
            debug!("Skipping generator argument at line {}", line(arguments));
            return;
        }

        let mut index = 0;
        for argument in named_children(arguments) {
            match argument.kind() {
                "keyword_argument" => {
                    let (Some(name), Some(value)) = (
                        argument.child_by_field_name("name"),
                        argument.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    let port = Slot::new(&call, EdgeKind::keyword(self.text(name)));
                    self.visit_expr(value, world, Some(&port));
                }
                "list_splat" | "dictionary_splat" => {
                    debug!("Skipping argument unpacking at line {}", line(argument));
                }
                _ => {
                    self.visit_expr(argument, world, Some(&Slot::new(&call, EdgeKind::positional(index))));
                    index += 1;
                }
            }
        }
    }

    fn visit_attribute(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let (Some(object), Some(attr)) = (expr.child_by_field_name("object"), expr.child_by_field_name("attribute")) else {
            return;
        };
        let id = self.add(NodeData::Attribute, self.text(attr), world);
        self.connect(&id, slot);
        self.visit_expr(object, world, Some(&Slot::new(&id, EdgeKind::AttributeValue)));
    }

    fn visit_subscript(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let Some(value) = expr.child_by_field_name("value") else {
            return;
        };
        let id = self.add(NodeData::Accessor, "[]", world);
        self.connect(&id, slot);
        self.visit_expr(value, world, Some(&Slot::new(&id, EdgeKind::AccessValue)));

        let keys = field_children(expr, "subscript");
        match keys.as_slice() {
            [key] => self.visit_expr(*key, world, Some(&Slot::new(&id, EdgeKind::AccessKey))),
            _ => debug!("Skipping multi-dimensional subscript at line {}", line(expr)),
        }
    }

    fn visit_list(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let id = self.add(NodeData::ListConstructor, "[]", world);
        self.connect(&id, slot);
        for (index, element) in named_children(expr).into_iter().enumerate() {
            self.visit_expr(element, world, Some(&Slot::new(&id, EdgeKind::ListElement { index })));
        }
    }

    fn visit_dict(&mut self, expr: TsNode, world: &WorldId, slot: Option<&Slot>) {
        let id = self.add(NodeData::DictConstructor, "{}", world);
        self.connect(&id, slot);

        let pairs = named_children(expr).into_iter().filter(|p| {
            let is_pair = p.kind() == "pair";
            if !is_pair {
                debug!("Skipping dict entry `{}` at line {}", p.kind(), line(*p));
            }
            is_pair
        });
        for (index, pair) in pairs.enumerate() {
            if let Some(key) = pair.child_by_field_name("key") {
                self.visit_expr(key, world, Some(&Slot::new(&id, EdgeKind::DictKey { index })));
            }
            if let Some(value) = pair.child_by_field_name("value") {
                self.visit_expr(value, world, Some(&Slot::new(&id, EdgeKind::DictValue { index })));
            }
        }
    }
}

fn line(node: TsNode) -> usize {
    node.start_position().row + 1
}

/// Identifiers bound by a loop target (`x`, `k, v`, `(a, b)`)
fn target_names(target: TsNode, source: &str) -> Vec<String> {
    match target.kind() {
        "identifier" => vec![text(target, source).to_string()],
        "pattern_list" | "tuple_pattern" | "list_pattern" | "parenthesized_expression" => named_children(target)
            .into_iter()
            .flat_map(|child| target_names(child, source))
            .collect(),
        _ => Vec::new(),
    }
}

/// Names an import statement binds in the importing scope
fn import_bindings(node: TsNode, source: &str) -> Vec<String> {
    if node.kind() == "future_import_statement" {
        return Vec::new();
    }
    let from_import = node.kind() == "import_from_statement";

    field_children(node, "name")
        .into_iter()
        .filter_map(|name| match name.kind() {
            "aliased_import" => name.child_by_field_name("alias").map(|a| text(a, source).to_string()),
            "dotted_name" => {
                let path = text(name, source);
                let bound = if from_import { path.rsplit('.').next() } else { path.split('.').next() };
                bound.map(str::to_string)
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::python::PythonParser;
    use crate::node::{NodeKind, VariableMode};

    fn build(source: &str) -> Graph {
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let mut visitor = WorldVisitor::new(source);
        visitor.visit_module(tree.root_node(), &WorldId::Root);
        visitor.finish()
    }

    fn variables<'g>(graph: &'g Graph, name: &str) -> Vec<&'g Node> {
        graph
            .nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Variable && n.label == name)
            .collect()
    }

    fn only<'g>(graph: &'g Graph, kind: NodeKind) -> &'g Node {
        let found: Vec<_> = graph.nodes_of_kind(kind).collect();
        assert_eq!(found.len(), 1, "expected one {} node", kind);
        found[0]
    }

    fn has_edge(graph: &Graph, source: &NodeId, target: &NodeId, kind: &EdgeKind) -> bool {
        graph.edges.contains(&Edge::new(source.clone(), target.clone(), kind.clone()))
    }

    #[test]
    fn test_assignment_and_read() {
        let graph = build("x = 1\ny = x + 2\nprint(y)\n");

        let x = variables(&graph, "x");
        let y = variables(&graph, "y");
        assert_eq!(x.len(), 1);
        assert_eq!(y.len(), 1);
        assert_eq!(x[0].variable().unwrap().version, 1);
        assert_eq!(y[0].variable().unwrap().version, 1);

        let op = only(&graph, NodeKind::Operator);
        assert_eq!(op.label, "+");
        assert!(has_edge(&graph, &x[0].id, &op.id, &EdgeKind::Operand { index: 0 }));
        assert!(has_edge(&graph, &op.id, &y[0].id, &EdgeKind::WritesTo));

        let call = only(&graph, NodeKind::Call);
        assert!(has_edge(&graph, &y[0].id, &call.id, &EdgeKind::positional(0)));
        // `print` is a callee, not a read
        assert_eq!(graph.nodes.len(), 6);
    }

    #[test]
    fn test_reassignment_versions() {
        let graph = build("x = 1\nx = 2\nx = 3\nprint(x)\n");

        let versions: Vec<u32> = variables(&graph, "x")
            .iter()
            .map(|n| n.variable().unwrap().version)
            .collect();
        assert_eq!(versions, vec![1, 2, 3]);

        let last = variables(&graph, "x")[2].id.clone();
        let call = only(&graph, NodeKind::Call);
        assert!(has_edge(&graph, &last, &call.id, &EdgeKind::positional(0)));
    }

    #[test]
    fn test_self_referencing_assignment_reads_previous_version() {
        let graph = build("x = 1\nx = x + 1\n");

        let x = variables(&graph, "x");
        let op = only(&graph, NodeKind::Operator);
        assert!(has_edge(&graph, &x[0].id, &op.id, &EdgeKind::Operand { index: 0 }));
        assert!(has_edge(&graph, &op.id, &x[1].id, &EdgeKind::WritesTo));
    }

    #[test]
    fn test_augmented_assignment() {
        let graph = build("total = 0\ntotal += 5\n");

        let total = variables(&graph, "total");
        assert_eq!(total.len(), 2);
        assert_eq!(total[1].variable().unwrap().version, 2);

        let op = only(&graph, NodeKind::Operator);
        assert_eq!(op.label, "+");
        assert!(has_edge(&graph, &total[0].id, &op.id, &EdgeKind::Operand { index: 0 }));
        assert!(has_edge(&graph, &op.id, &total[1].id, &EdgeKind::WritesTo));
    }

    #[test]
    fn test_function_params_seeded() {
        let graph = build("def f(a, b=2, *rest, **opts):\n    return a\n");

        let def = only(&graph, NodeKind::FunctionDef);
        let params = def.params();
        assert_eq!(params.len(), 4);
        assert!(!params[0].optional);
        assert_eq!(params[1].default.as_deref(), Some("2"));
        assert_eq!(params[2].kind, ParamKind::VarArgs);
        assert_eq!(params[3].kind, ParamKind::KwArgs);

        let inner = WorldId::Node(def.id.clone());
        let a = variables(&graph, "a")[0];
        assert_eq!(a.world, inner);
        assert_eq!(a.variable().unwrap().mode, VariableMode::Param);
        assert_eq!(a.variable().unwrap().version, 1);

        let ret = only(&graph, NodeKind::Return);
        assert!(has_edge(&graph, &a.id, &ret.id, &EdgeKind::Input));
    }

    #[test]
    fn test_function_param_separators_kept() {
        let graph = build("def f(a, /, b, *, c=1):\n    return a\n");

        let def = only(&graph, NodeKind::FunctionDef);
        let kinds: Vec<ParamKind> = def.params().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParamKind::Positional,
                ParamKind::PositionalOnly,
                ParamKind::Positional,
                ParamKind::KeywordOnly,
                ParamKind::Positional,
            ]
        );
        assert!(variables(&graph, "").is_empty());
        assert_eq!(variables(&graph, "c").len(), 1);
    }

    #[test]
    fn test_closure_proxy_created_once() {
        let source = "def outer():\n    x = 1\n    def inner():\n        print(x)\n        print(x)\n    inner()\n";
        let graph = build(source);

        let xs = variables(&graph, "x");
        let origin = xs.iter().find(|n| n.variable().unwrap().is_write()).unwrap();
        let proxies: Vec<_> = xs
            .iter()
            .filter(|n| matches!(n.variable().unwrap().mode, VariableMode::ClosureRead { .. }))
            .collect();
        assert_eq!(proxies.len(), 1);

        let closure_edges: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::ClosureOf)
            .collect();
        assert_eq!(closure_edges.len(), 1);
        assert_eq!(closure_edges[0].source, origin.id);
        assert_eq!(closure_edges[0].target, proxies[0].id);

        let inner_def = graph
            .nodes_of_kind(NodeKind::FunctionDef)
            .find(|n| n.label == "inner")
            .unwrap();
        assert_eq!(proxies[0].world, WorldId::Node(inner_def.id.clone()));
    }

    #[test]
    fn test_if_else_chain() {
        let graph = build("cond = True\nif cond:\n    a = 1\nelif cond:\n    a = 2\nelse:\n    a = 3\n");

        let head = only(&graph, NodeKind::IfBlock);
        let elif = only(&graph, NodeKind::ElifBlock);
        let other = only(&graph, NodeKind::ElseBlock);
        assert_eq!(head.label, "if cond");
        assert_eq!(elif.label, "elif cond");
        assert!(has_edge(&graph, &head.id, &elif.id, &EdgeKind::NextClause { index: None }));
        assert!(has_edge(&graph, &elif.id, &other.id, &EdgeKind::NextClause { index: None }));

        let a = variables(&graph, "a");
        assert_eq!(a.len(), 3);
        for var in &a {
            assert_eq!(var.variable().unwrap().version, 1);
        }
        assert_eq!(a[2].world, WorldId::Node(other.id.clone()));
    }

    #[test]
    fn test_for_loop_target_seeded() {
        let graph = build("items = [1, 2]\nfor k, v in items:\n    print(k)\n");

        let block = only(&graph, NodeKind::ForBlock);
        assert_eq!(block.label, "for k, v in items");
        let inner = WorldId::Node(block.id.clone());
        assert_eq!(variables(&graph, "k")[0].world, inner);
        assert_eq!(variables(&graph, "v")[0].world, inner);

        let items = variables(&graph, "items")[0];
        assert!(has_edge(&graph, &items.id, &block.id, &EdgeKind::IteratesOn));

        let list = only(&graph, NodeKind::ListConstructor);
        let elements = graph.edges_to_by(&list.id, |k| matches!(k, EdgeKind::ListElement { .. }));
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_try_handlers() {
        let source = "try:\n    x = 1\nexcept ValueError as err:\n    print(err)\nexcept:\n    pass\n";
        let graph = build(source);

        let block = only(&graph, NodeKind::TryBlock);
        let handlers: Vec<_> = graph.nodes_of_kind(NodeKind::ExceptBlock).collect();
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].label, "except ValueError as err");
        assert_eq!(handlers[1].label, "except");
        assert!(has_edge(&graph, &block.id, &handlers[0].id, &EdgeKind::NextClause { index: Some(0) }));
        assert!(has_edge(&graph, &block.id, &handlers[1].id, &EdgeKind::NextClause { index: Some(1) }));

        let err = variables(&graph, "err")[0];
        assert_eq!(err.world, WorldId::Node(handlers[0].id.clone()));
    }

    #[test]
    fn test_imports_live_in_imports_world() {
        let graph = build("import os.path\nfrom math import sqrt as root\nprint(root(4))\n");

        let imports: Vec<_> = graph.nodes_of_kind(NodeKind::Import).collect();
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().all(|n| n.world == WorldId::Imports));
        assert_eq!(imports[0].label, "import os.path");
        match &imports[0].data {
            NodeData::Import { bindings } => assert_eq!(bindings, &vec!["os".to_string()]),
            other => panic!("unexpected payload {:?}", other),
        }

        // `root` is a callee here, so no proxy
        assert!(variables(&graph, "root").is_empty());
    }

    #[test]
    fn test_method_call_receiver() {
        let graph = build("items = []\nitems.append(3)\n");

        let call = only(&graph, NodeKind::Call);
        assert_eq!(call.label, "append");
        assert!(call.call().unwrap().is_method);

        let items = variables(&graph, "items")[0];
        assert!(has_edge(&graph, &items.id, &call.id, &EdgeKind::AttributeValue));
    }

    #[test]
    fn test_keyword_arguments_do_not_advance_index() {
        let graph = build("print(1, sep='-', end='')\n");

        let call = only(&graph, NodeKind::Call);
        let kinds: Vec<EdgeKind> = graph.edges_to(&call.id).map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![EdgeKind::positional(0), EdgeKind::keyword("sep"), EdgeKind::keyword("end")]
        );
    }

    #[test]
    fn test_orphan_expressions_not_recorded() {
        let graph = build("1\nx\n\"doc\"\n");
        assert!(graph.nodes.is_empty());
    }

    #[test]
    fn test_unsupported_assignment_skipped() {
        let graph = build("a, b = 1, 2\nc = 3\n");
        assert!(variables(&graph, "a").is_empty());
        assert_eq!(variables(&graph, "c").len(), 1);
    }

    #[test]
    fn test_negative_literal_and_unary() {
        let graph = build("a = -1\nb = not a\n");

        let literal = only(&graph, NodeKind::Literal);
        assert_eq!(literal.label, "-1");
        let op = only(&graph, NodeKind::Operator);
        assert_eq!(op.label, "not");
        assert_eq!(op.data, NodeData::Operator { unary: true });
    }

    #[test]
    fn test_comparison_operator_text() {
        let graph = build("a = 1\nb = a not in [1]\n");
        let op = only(&graph, NodeKind::Operator);
        assert_eq!(op.label, "not in");
    }

    #[test]
    fn test_dict_and_subscript() {
        let graph = build("d = {'a': 1, 'b': 2}\nv = d['a']\n");

        let dict = only(&graph, NodeKind::DictConstructor);
        let keys = graph.edges_to_by(&dict.id, |k| matches!(k, EdgeKind::DictKey { .. }));
        let values = graph.edges_to_by(&dict.id, |k| matches!(k, EdgeKind::DictValue { .. }));
        assert_eq!(keys.len(), 2);
        assert_eq!(values.len(), 2);

        let accessor = only(&graph, NodeKind::Accessor);
        let d = variables(&graph, "d")[0];
        assert!(has_edge(&graph, &d.id, &accessor.id, &EdgeKind::AccessValue));
        assert_eq!(graph.edges_to_by(&accessor.id, |k| *k == EdgeKind::AccessKey).len(), 1);
    }

    #[test]
    fn test_class_body_world() {
        let graph = build("class Point(Base):\n    def norm(self):\n        return self.x\n");

        let class = only(&graph, NodeKind::ClassDef);
        assert_eq!(class.data, NodeData::ClassDef { bases: vec!["Base".to_string()] });
        let method = only(&graph, NodeKind::FunctionDef);
        assert_eq!(method.world, WorldId::Node(class.id.clone()));

        let attr = only(&graph, NodeKind::Attribute);
        assert_eq!(attr.label, "x");
    }
}
