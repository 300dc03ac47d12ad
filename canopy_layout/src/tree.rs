// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The node arena and the two layout passes.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use canopy_property::{
    Effect, Error, ErrorCode, InvalidateMode, ListenerId, ObjectType, Property,
    PropertyDescriptor, PropertyEvent, PropertyStore, PropertyType, Result, SetOptions, Value,
};
use kurbo::{Point, Rect, Size};

use crate::children::Children;
use crate::layout::{Layout, LayoutCx};
use crate::render::Renderer;
use crate::types::{InvalidateReason, LayoutFlags, NodeId};
use crate::visual::{
    Alignment, HEIGHT, HORIZONTAL_ALIGNMENT, IS_VISIBLE, MARGIN, MAX_HEIGHT, MAX_WIDTH,
    MIN_HEIGHT, MIN_WIDTH, OPACITY, VERTICAL_ALIGNMENT, WIDTH, deflate, inflate,
};

struct Node {
    parent: Option<NodeId>,
    children: Children,
    store: PropertyStore,
    /// Taken out while the node's own layout callback runs.
    layout: Option<Box<dyn Layout>>,
    flags: LayoutFlags,
    /// Constraint of the last measure.
    constraint: Option<Size>,
    desired: Size,
    /// Slot passed to the last arrange, margins included.
    slot: Option<Rect>,
    arranged: Rect,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Sizing properties of one node, read once per pass.
#[derive(Copy, Clone)]
struct Sizing {
    width: f64,
    height: f64,
    min: Size,
    max: Size,
}

impl Sizing {
    fn read(store: &PropertyStore) -> Self {
        Self {
            width: store.get(*WIDTH),
            height: store.get(*HEIGHT),
            min: Size::new(store.get(*MIN_WIDTH), store.get(*MIN_HEIGHT)),
            max: Size::new(store.get(*MAX_WIDTH), store.get(*MAX_HEIGHT)),
        }
    }

    /// Picks the explicit extent when set, else `fallback`, then applies the
    /// bounds. The minimum wins over the maximum.
    fn resolve(&self, fallback: Size) -> Size {
        let pick = |explicit: f64, fallback: f64| if explicit.is_nan() { fallback } else { explicit };
        Size::new(
            pick(self.width, fallback.width)
                .min(self.max.width)
                .max(self.min.width),
            pick(self.height, fallback.height)
                .min(self.max.height)
                .max(self.min.height),
        )
    }
}

/// A tree of laid-out nodes.
///
/// Every node owns a [`PropertyStore`], a [`Layout`] and its layout state.
/// Nodes are addressed by generational [`NodeId`]s; parent links are ids,
/// not references.
///
/// ```rust
/// use canopy_layout::{Tree, Visual, WIDTH, HEIGHT};
/// use kurbo::{Rect, Size};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(Visual);
/// let child = tree.insert(Visual);
/// tree.append_child(root, child).unwrap();
/// tree.set(child, *WIDTH, 40.0).unwrap();
/// tree.set(child, *HEIGHT, 20.0).unwrap();
///
/// tree.update_layout(root, Size::new(100.0, 100.0)).unwrap();
/// assert_eq!(tree.desired_size(root).unwrap(), Size::new(40.0, 20.0));
/// // Stretch alignment centers a fixed-size child.
/// assert_eq!(
///     tree.arranged_rect(child).unwrap(),
///     Rect::new(30.0, 40.0, 70.0, 60.0)
/// );
/// ```
#[derive(Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    len: usize,
}

impl Tree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live nodes.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree has no live nodes.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Adds a detached node whose runtime type comes from the layout.
    pub fn insert(&mut self, layout: impl Layout) -> NodeId {
        let object_type = layout.object_type();
        self.alloc(Box::new(layout), object_type)
    }

    /// Adds a detached node with an explicit runtime type.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::NotPropertyOwner`] if `object_type` cannot own properties.
    pub fn insert_with_type(
        &mut self,
        layout: impl Layout,
        object_type: &'static ObjectType,
    ) -> Result<NodeId> {
        if !object_type.is_property_owner() {
            return Err(Error::invariant(
                ErrorCode::NotPropertyOwner,
                format!("`{object_type}` cannot back a node"),
            ));
        }
        Ok(self.alloc(Box::new(layout), object_type))
    }

    fn alloc(&mut self, layout: Box<dyn Layout>, object_type: &'static ObjectType) -> NodeId {
        let node = Node {
            parent: None,
            children: Children::default(),
            store: PropertyStore::new(object_type),
            layout: Some(layout),
            flags: LayoutFlags::default(),
            constraint: None,
            desired: Size::ZERO,
            slot: None,
            arranged: Rect::ZERO,
        };
        self.len += 1;
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            NodeId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            NodeId::new(idx, 1)
        }
    }

    /// Removes a node and its whole subtree, detaching it from its parent.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.node_ref(node)?.parent {
            if let Some(p) = self.node_mut_opt(parent) {
                p.children.remove(node);
            }
            self.invalidate_with(parent, InvalidateMode::MEASURE, InvalidateReason::ChildRemoved);
        }
        let mut stack = alloc::vec![node];
        while let Some(id) = stack.pop() {
            let slot = &mut self.slots[id.idx()];
            if slot.generation != id.generation() {
                continue;
            }
            if let Some(mut removed) = slot.node.take() {
                stack.extend(removed.children.take());
                self.free_list.push(id.0);
                self.len -= 1;
            }
        }
        Ok(())
    }

    /// Returns `true` if `node` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.node_opt(node).is_some()
    }

    /// Returns the parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node_opt(node).and_then(|n| n.parent)
    }

    /// Returns the children of `node`; empty for stale ids.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node_opt(node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the declared capacity of `node`'s children.
    #[must_use]
    pub fn child_capacity(&self, node: NodeId) -> Option<usize> {
        self.node_opt(node).and_then(|n| n.children.capacity())
    }

    /// Returns the runtime type of `node`.
    #[must_use]
    pub fn object_type(&self, node: NodeId) -> Option<&'static ObjectType> {
        self.node_opt(node).map(|n| n.store.object_type())
    }

    /// Returns the layout state of `node`.
    #[must_use]
    pub fn flags(&self, node: NodeId) -> Option<LayoutFlags> {
        self.node_opt(node).map(|n| n.flags)
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::AlreadyParented`] if `child` has a parent.
    /// - [`ErrorCode::CyclicParent`] if `child` is `parent` or one of its ancestors.
    /// - [`ErrorCode::CapacityExceeded`] if `parent` is full.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.node_ref(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` at `index` among `parent`'s children.
    ///
    /// # Errors
    ///
    /// As [`append_child`](Self::append_child), plus
    /// [`Error::InvalidArgument`] if `index` is past the end.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.node_ref(parent)?;
        if let Some(current) = self.node_ref(child)?.parent {
            return Err(Error::invariant(
                ErrorCode::AlreadyParented,
                format!("{child:?} is already a child of {current:?}"),
            ));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(Error::invariant(
                ErrorCode::CyclicParent,
                format!("{child:?} cannot become a descendant of itself"),
            ));
        }
        self.node_mut(parent)?.children.insert(index, child)?;
        self.node_mut(child)?.parent = Some(parent);
        self.invalidate_with(parent, InvalidateMode::MEASURE, InvalidateReason::ChildAdded);
        Ok(())
    }

    /// Detaches `child` from `parent`. The child stays alive as a root.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.node_ref(child)?.parent != Some(parent) {
            return Err(Error::invalid_argument(
                "child",
                format!("{child:?} is not a child of {parent:?}"),
            ));
        }
        self.node_mut(parent)?.children.remove(child);
        self.node_mut(child)?.parent = None;
        self.invalidate_with(parent, InvalidateMode::MEASURE, InvalidateReason::ChildRemoved);
        Ok(())
    }

    /// Bounds the number of children `node` accepts. `None` lifts the bound.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::CapacityExceeded`] if `node` already has more children.
    pub fn set_child_capacity(&mut self, node: NodeId, capacity: Option<usize>) -> Result<()> {
        self.node_mut(node)?.children.set_capacity(capacity)
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the property store of `node`.
    #[must_use]
    pub fn properties(&self, node: NodeId) -> Option<&PropertyStore> {
        self.node_opt(node).map(|n| &n.store)
    }

    /// Returns the effective value of `property` on `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is stale.
    #[must_use]
    pub fn get<T: PropertyType>(&self, node: NodeId, property: Property<T>) -> T {
        match self.node_opt(node) {
            Some(n) => n.store.get(property),
            None => panic!("stale {node:?} while reading `{}`", property.name()),
        }
    }

    /// Returns the local value of `property` on `node`, if any.
    #[must_use]
    pub fn try_get<T: PropertyType>(&self, node: NodeId, property: Property<T>) -> Option<T> {
        self.node_opt(node).and_then(|n| n.store.try_get(property))
    }

    /// Returns `true` if `node` has a local value for `property`.
    #[must_use]
    pub fn is_set<T>(&self, node: NodeId, property: Property<T>) -> bool {
        self.node_opt(node).is_some_and(|n| n.store.is_set(property))
    }

    /// Sets a property and invalidates according to its descriptor.
    ///
    /// Returns `true` if the value changed.
    pub fn set<T: PropertyType>(
        &mut self,
        node: NodeId,
        property: Property<T>,
        value: T,
    ) -> Result<bool> {
        self.set_value(node, property.descriptor(), value.into_value(), SetOptions::empty())
    }

    /// Sets a property with explicit options.
    pub fn set_with<T: PropertyType>(
        &mut self,
        node: NodeId,
        property: Property<T>,
        value: T,
        options: SetOptions,
    ) -> Result<bool> {
        self.set_value(node, property.descriptor(), value.into_value(), options)
    }

    /// Sets a dynamically typed value.
    pub fn set_value(
        &mut self,
        node: NodeId,
        descriptor: &'static PropertyDescriptor,
        value: Value,
        options: SetOptions,
    ) -> Result<bool> {
        let store = &mut self.node_mut(node)?.store;
        let changed = store.set_value(descriptor, value, options)?;
        if changed {
            let resolved = store.resolve(descriptor);
            self.invalidate_with(
                node,
                resolved.invalidate_mode(),
                InvalidateReason::PropertyChanged(resolved.name()),
            );
        }
        Ok(changed)
    }

    /// Clears the local value of `property` and returns it.
    pub fn reset<T: PropertyType>(
        &mut self,
        node: NodeId,
        property: Property<T>,
    ) -> Result<Option<T>> {
        let store = &mut self.node_mut(node)?.store;
        let Some(old) = store.reset_value(property.descriptor()) else {
            return Ok(None);
        };
        let resolved = store.resolve(property.descriptor());
        self.invalidate_with(
            node,
            resolved.invalidate_mode(),
            InvalidateReason::PropertyChanged(resolved.name()),
        );
        Ok(T::from_value(&old))
    }

    /// Subscribes to property events of `node`.
    pub fn subscribe<F>(&mut self, node: NodeId, listener: F) -> Result<ListenerId>
    where
        F: FnMut(&PropertyEvent<'_>) + Send + 'static,
    {
        Ok(self.node_mut(node)?.store.subscribe(listener))
    }

    /// Removes a listener from `node`.
    pub fn unsubscribe(&mut self, node: NodeId, id: ListenerId) -> bool {
        self.node_mut_opt(node)
            .is_some_and(|n| n.store.unsubscribe(id))
    }

    /// Returns `true` if `node` is alive and visible.
    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.node_opt(node)
            .is_some_and(|n| n.store.get(*IS_VISIBLE))
    }

    /// Product of the opacities of `node` and its ancestors.
    #[must_use]
    pub fn effective_opacity(&self, node: NodeId) -> f64 {
        let mut opacity = 1.0;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.node_opt(id) else { break };
            opacity *= n.store.get(*OPACITY);
            current = n.parent;
        }
        opacity
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Marks `node` (and, as `mode` requires, its parent) for recomputation.
    ///
    /// The self half of `mode` is reduced with
    /// [`InvalidateMode::self_effect`] and applied to `node`; the parent half
    /// with [`InvalidateMode::parent_effect`] and applied to the parent.
    /// Measure and arrange effects mark every ancestor up to the root so the
    /// next top-down pass reaches the node; a render effect marks only its
    /// target.
    pub fn invalidate(
        &mut self,
        node: NodeId,
        mode: InvalidateMode,
        reason: InvalidateReason,
    ) -> Result<()> {
        self.node_ref(node)?;
        self.invalidate_with(node, mode, reason);
        Ok(())
    }

    fn invalidate_with(&mut self, node: NodeId, mode: InvalidateMode, reason: InvalidateReason) {
        let own = mode.self_effect();
        let parent = self.parent(node);
        let up = if parent.is_some() {
            mode.parent_effect()
        } else {
            Effect::None
        };
        if own == Effect::None && up == Effect::None {
            return;
        }
        tracing::trace!(?node, ?mode, ?reason, ?own, ?up, "invalidate");
        self.apply_effect(node, own);
        if let Some(parent) = parent {
            self.apply_effect(parent, up);
        }
    }

    fn apply_effect(&mut self, node: NodeId, effect: Effect) {
        let (own, path) = match effect {
            Effect::None => return,
            Effect::Render => (LayoutFlags::RENDER, LayoutFlags::empty()),
            Effect::Arrange => (
                LayoutFlags::ARRANGE | LayoutFlags::RENDER,
                LayoutFlags::ARRANGE,
            ),
            Effect::Measure => (LayoutFlags::DIRTY, LayoutFlags::MEASURE | LayoutFlags::ARRANGE),
        };
        let Some(n) = self.node_mut_opt(node) else {
            return;
        };
        n.flags |= own;
        let mut current = n.parent;
        if path.is_empty() {
            return;
        }
        while let Some(id) = current {
            let Some(n) = self.node_mut_opt(id) else { break };
            n.flags |= path;
            current = n.parent;
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Measures `node` against `available` and returns its desired size,
    /// margins included.
    ///
    /// Results are cached: a node that is not marked for measure and sees the
    /// same constraint returns its previous size without visiting children.
    /// Invisible nodes measure to zero.
    ///
    /// # Errors
    ///
    /// Fails for stale ids, `NaN` constraints, and errors from the layout.
    pub fn measure(&mut self, node: NodeId, available: Size) -> Result<Size> {
        if available.width.is_nan() || available.height.is_nan() {
            return Err(Error::invalid_argument(
                "available",
                "constraint cannot be NaN",
            ));
        }
        let visible = self.is_visible(node);
        let n = self.node_mut(node)?;
        if !visible {
            n.desired = Size::ZERO;
            n.constraint = Some(available);
            n.flags.remove(LayoutFlags::MEASURE);
            n.flags.insert(LayoutFlags::MEASURED);
            return Ok(Size::ZERO);
        }
        if !n.flags.contains(LayoutFlags::MEASURE) && n.constraint == Some(available) {
            return Ok(n.desired);
        }

        let margin = n.store.get(*MARGIN);
        let sizing = Sizing::read(&n.store);
        let content_available = sizing.resolve(deflate(available, margin));

        let content = self.with_layout(node, |layout, cx| {
            layout.measure_core(cx, content_available)
        })?;
        let size = sizing.resolve(content);
        let desired = inflate(size, margin);
        let desired = Size::new(finite_or_zero(desired.width), finite_or_zero(desired.height));

        let n = self.node_mut(node)?;
        n.desired = desired;
        n.constraint = Some(available);
        n.flags.remove(LayoutFlags::MEASURE);
        n.flags
            .insert(LayoutFlags::MEASURED | LayoutFlags::ARRANGE);
        tracing::trace!(?node, ?available, ?desired, "measured");
        Ok(desired)
    }

    /// Places `node` in `rect`, margins included, then arranges its children.
    ///
    /// The node's alignment positions it within the slot when it does not
    /// fill it. Invisible nodes are skipped and lose their arranged state.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for stale ids or non-finite rectangles.
    /// - [`ErrorCode::NotMeasured`] if the node has not been measured since
    ///   its last measure invalidation.
    pub fn arrange(&mut self, node: NodeId, rect: Rect) -> Result<()> {
        if ![rect.x0, rect.y0, rect.x1, rect.y1]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(Error::invalid_argument(
                "rect",
                format!("arrange needs a finite rectangle, got {rect:?}"),
            ));
        }
        let visible = self.is_visible(node);
        let n = self.node_mut(node)?;
        if !visible {
            n.slot = None;
            n.flags.remove(LayoutFlags::ARRANGE | LayoutFlags::ARRANGED);
            return Ok(());
        }
        if !n.flags.contains(LayoutFlags::MEASURED) || n.flags.contains(LayoutFlags::MEASURE) {
            return Err(Error::invalid_operation(
                ErrorCode::NotMeasured,
                format!("{node:?} must be measured before it is arranged"),
            ));
        }
        if !n.flags.contains(LayoutFlags::ARRANGE) && n.slot == Some(rect) {
            return Ok(());
        }

        let margin = n.store.get(*MARGIN);
        let sizing = Sizing::read(&n.store);
        let h_align = n.store.get(*HORIZONTAL_ALIGNMENT);
        let v_align = n.store.get(*VERTICAL_ALIGNMENT);
        let desired = deflate(n.desired, margin);

        let slot = deflate(rect.size(), margin);
        let fallback = Size::new(
            if h_align == Alignment::Stretch {
                slot.width
            } else {
                desired.width
            },
            if v_align == Alignment::Stretch {
                slot.height
            } else {
                desired.height
            },
        );
        let size = sizing.resolve(fallback);
        let origin = Point::new(
            rect.x0 + margin.x0 + h_align.offset(slot.width, size.width),
            rect.y0 + margin.y0 + v_align.offset(slot.height, size.height),
        );
        let content = Rect::from_origin_size(origin, size);

        self.with_layout(node, |layout, cx| layout.arrange_core(cx, content))?;

        let n = self.node_mut(node)?;
        n.slot = Some(rect);
        n.arranged = content;
        n.flags.remove(LayoutFlags::ARRANGE);
        n.flags
            .insert(LayoutFlags::ARRANGED | LayoutFlags::RENDER);
        tracing::trace!(?node, ?rect, ?content, "arranged");
        Ok(())
    }

    /// Measures `root` against `available`, then arranges it at the origin.
    ///
    /// Finite extents of `available` become the arranged slot; infinite ones
    /// fall back to the desired size. Returns the root's arranged rectangle.
    pub fn update_layout(&mut self, root: NodeId, available: Size) -> Result<Rect> {
        let desired = self.measure(root, available)?;
        let size = Size::new(
            if available.width.is_finite() {
                available.width
            } else {
                desired.width
            },
            if available.height.is_finite() {
                available.height
            } else {
                desired.height
            },
        );
        self.arrange(root, Rect::from_origin_size(Point::ZERO, size))?;
        self.arranged_rect(root)
    }

    /// Returns the last desired size of `node`, margins included.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::NotMeasured`] if the node was never measured.
    pub fn desired_size(&self, node: NodeId) -> Result<Size> {
        let n = self.node_ref(node)?;
        if n.flags.contains(LayoutFlags::MEASURED) {
            Ok(n.desired)
        } else {
            Err(Error::invalid_operation(
                ErrorCode::NotMeasured,
                format!("{node:?} has not been measured"),
            ))
        }
    }

    /// Returns the rectangle `node` was arranged in, margins excluded.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::NotArranged`] if the node was never arranged.
    pub fn arranged_rect(&self, node: NodeId) -> Result<Rect> {
        let n = self.node_ref(node)?;
        if n.flags.contains(LayoutFlags::ARRANGED) {
            Ok(n.arranged)
        } else {
            Err(Error::invalid_operation(
                ErrorCode::NotArranged,
                format!("{node:?} has not been arranged"),
            ))
        }
    }

    /// Returns the layout of `node` if it is an `L`.
    #[must_use]
    pub fn layout<L: Layout>(&self, node: NodeId) -> Option<&L> {
        let layout: &dyn Any = self.node_opt(node)?.layout.as_deref()?;
        layout.downcast_ref()
    }

    /// Returns the layout of `node` mutably if it is an `L`.
    ///
    /// Changes made through this reference do not invalidate the node; call
    /// [`invalidate`](Self::invalidate) if they affect layout.
    #[must_use]
    pub fn layout_mut<L: Layout>(&mut self, node: NodeId) -> Option<&mut L> {
        let layout: &mut dyn Any = self.node_mut_opt(node)?.layout.as_deref_mut()?;
        layout.downcast_mut()
    }

    fn with_layout<R>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut dyn Layout, &mut LayoutCx<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut layout = self.node_mut(node)?.layout.take().ok_or_else(|| {
            Error::invalid_argument("node", format!("{node:?} is already being laid out"))
        })?;
        let result = f(layout.as_mut(), &mut LayoutCx { tree: self, node });
        if let Some(n) = self.node_mut_opt(node) {
            n.layout = Some(layout);
        }
        result
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Hands every visible, arranged node marked for render to `renderer`,
    /// parents before children, and clears the mark. Returns how many nodes
    /// were rendered.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::NotArranged`] if `root` has pending layout work or was
    /// never arranged.
    pub fn render(&mut self, root: NodeId, renderer: &mut impl Renderer) -> Result<usize> {
        let flags = self.node_ref(root)?.flags;
        if !flags.contains(LayoutFlags::ARRANGED)
            || flags.intersects(LayoutFlags::MEASURE | LayoutFlags::ARRANGE)
        {
            return Err(Error::invalid_operation(
                ErrorCode::NotArranged,
                format!("{root:?} must be measured and arranged before rendering"),
            ));
        }

        let mut rendered = Vec::new();
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let Some(n) = self.node_opt(id) else { continue };
            if !n.flags.contains(LayoutFlags::ARRANGED) || !n.store.get(*IS_VISIBLE) {
                continue;
            }
            if n.flags.contains(LayoutFlags::RENDER) {
                renderer.render(self, id, n.arranged);
                rendered.push(id);
            }
            stack.extend(n.children.as_slice().iter().rev().copied());
        }
        for id in &rendered {
            if let Some(n) = self.node_mut_opt(*id) {
                n.flags.remove(LayoutFlags::RENDER);
            }
        }
        tracing::trace!(?root, count = rendered.len(), "rendered");
        Ok(rendered.len())
    }

    // =========================================================================
    // Slots
    // =========================================================================

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation == id.generation() {
            slot.node.as_ref()
        } else {
            None
        }
    }

    fn node_mut_opt(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation == id.generation() {
            slot.node.as_mut()
        } else {
            None
        }
    }

    fn node_ref(&self, id: NodeId) -> Result<&Node> {
        self.node_opt(id).ok_or_else(|| stale(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut_opt(id).ok_or_else(|| stale(id))
    }
}

fn stale(id: NodeId) -> Error {
    Error::invalid_argument("node", format!("{id:?} is not a live node"))
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("free", &self.free_list.len())
            .finish()
    }
}
