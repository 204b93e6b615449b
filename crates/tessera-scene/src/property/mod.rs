// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The render-state property taxonomy.
//!
//! A [`Property`] is one render-state object of a fixed [`PropertyKind`],
//! built from a scene-description block and refreshed from it on every
//! update pass. The kind set is closed: every concrete kind is one variant
//! of a private state enum and implements [`PropertyType`], which ties the
//! type to its kind tag at compile time. Narrowing a property to a concrete
//! type is therefore a tag comparison that yields `None` on mismatch.
//!
//! Properties are shared between nodes through [`PropertyHandle`]s. Adding a
//! new kind means adding a variant, a `PropertyType` impl and a case in
//! [`PropertyKind::ALL`]; the registry and lists pick it up from there.

mod alpha;
mod list;
mod material;
mod registry;
mod texturing;
mod toggle;
mod zbuffer;

pub use alpha::AlphaProperty;
pub use list::PropertyList;
pub use material::{MaterialProperty, MAX_GLOSSINESS};
pub use registry::PropertyRegistry;
pub use texturing::TexturingProperty;
pub use toggle::{SpecularProperty, WireframeProperty};
pub use zbuffer::ZBufferProperty;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use tessera_core::animation::{Animatable, ControlValue};
use tessera_core::renderer::CompareFunction;
use tessera_core::scene::SourceError;
use tessera_core::{BlockHandle, SceneSource};

/// The discriminant of the render-state taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    /// Alpha blending and testing.
    Alpha,
    /// Depth testing and writes.
    ZBuffer,
    /// Lighting material.
    Material,
    /// Base texture.
    Texturing,
    /// Specular highlight toggle.
    Specular,
    /// Wireframe toggle.
    Wireframe,
}

impl PropertyKind {
    /// Every kind, in declaration order.
    pub const ALL: [PropertyKind; 6] = [
        PropertyKind::Alpha,
        PropertyKind::ZBuffer,
        PropertyKind::Material,
        PropertyKind::Texturing,
        PropertyKind::Specular,
        PropertyKind::Wireframe,
    ];

    /// The block type this kind is built from.
    pub const fn type_name(self) -> &'static str {
        match self {
            PropertyKind::Alpha => "NiAlphaProperty",
            PropertyKind::ZBuffer => "NiZBufferProperty",
            PropertyKind::Material => "NiMaterialProperty",
            PropertyKind::Texturing => "NiTexturingProperty",
            PropertyKind::Specular => "NiSpecularProperty",
            PropertyKind::Wireframe => "NiWireframeProperty",
        }
    }

    /// Returns the kind whose block type is exactly `name`.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_name() == name)
    }

    /// Returns the kind of `block`, following the source's type hierarchy so
    /// derived block types resolve to their base kind.
    pub fn classify(source: &dyn SceneSource, block: BlockHandle) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| source.inherits(block, kind.type_name()))
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

mod sealed {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum PropertyState {
        Alpha(AlphaProperty),
        ZBuffer(ZBufferProperty),
        Material(MaterialProperty),
        Texturing(TexturingProperty),
        Specular(SpecularProperty),
        Wireframe(WireframeProperty),
    }

    pub trait Sealed: Sized {
        fn narrow(state: &PropertyState) -> Option<&Self>;
        fn narrow_mut(state: &mut PropertyState) -> Option<&mut Self>;
    }
}

use sealed::PropertyState;

/// A concrete property type, statically tied to its [`PropertyKind`].
///
/// This trait is sealed; the set of kinds is closed.
pub trait PropertyType: sealed::Sealed + 'static {
    /// The kind tag of this type.
    const KIND: PropertyKind;
}

macro_rules! property_type {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {
                fn narrow(state: &PropertyState) -> Option<&Self> {
                    match state {
                        PropertyState::$kind(p) => Some(p),
                        _ => None,
                    }
                }

                fn narrow_mut(state: &mut PropertyState) -> Option<&mut Self> {
                    match state {
                        PropertyState::$kind(p) => Some(p),
                        _ => None,
                    }
                }
            }

            impl PropertyType for $ty {
                const KIND: PropertyKind = PropertyKind::$kind;
            }
        )*
    };
}

property_type! {
    AlphaProperty => Alpha,
    ZBufferProperty => ZBuffer,
    MaterialProperty => Material,
    TexturingProperty => Texturing,
    SpecularProperty => Specular,
    WireframeProperty => Wireframe,
}

/// One render-state object and the block it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    block: BlockHandle,
    state: PropertyState,
}

impl Property {
    /// Creates a property of `kind` with default content, bound to `block`.
    /// Call [`Property::update`] to read the block.
    pub fn new(kind: PropertyKind, block: BlockHandle) -> Self {
        let state = match kind {
            PropertyKind::Alpha => PropertyState::Alpha(AlphaProperty::default()),
            PropertyKind::ZBuffer => PropertyState::ZBuffer(ZBufferProperty::default()),
            PropertyKind::Material => PropertyState::Material(MaterialProperty::default()),
            PropertyKind::Texturing => PropertyState::Texturing(TexturingProperty::default()),
            PropertyKind::Specular => PropertyState::Specular(SpecularProperty::default()),
            PropertyKind::Wireframe => PropertyState::Wireframe(WireframeProperty::default()),
        };
        Self { block, state }
    }

    /// Returns the kind. It never changes over the property's lifetime.
    pub fn kind(&self) -> PropertyKind {
        match self.state {
            PropertyState::Alpha(_) => PropertyKind::Alpha,
            PropertyState::ZBuffer(_) => PropertyKind::ZBuffer,
            PropertyState::Material(_) => PropertyKind::Material,
            PropertyState::Texturing(_) => PropertyKind::Texturing,
            PropertyState::Specular(_) => PropertyKind::Specular,
            PropertyState::Wireframe(_) => PropertyKind::Wireframe,
        }
    }

    /// Returns the block this property reads from.
    pub fn block(&self) -> BlockHandle {
        self.block
    }

    /// Narrows to a concrete type, or returns `None` if the kinds differ.
    pub fn cast<T: PropertyType>(&self) -> Option<&T> {
        if self.kind() != T::KIND {
            return None;
        }
        T::narrow(&self.state)
    }

    /// Mutable counterpart of [`Property::cast`].
    pub fn cast_mut<T: PropertyType>(&mut self) -> Option<&mut T> {
        if self.kind() != T::KIND {
            return None;
        }
        T::narrow_mut(&mut self.state)
    }

    /// Re-reads this property from `block`, re-pointing it there.
    ///
    /// Reading is idempotent. If the block no longer exists the current
    /// content is kept; stale properties are reclaimed by
    /// [`PropertyList::validate`].
    pub fn update(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        if !source.contains(block) {
            log::debug!("{} block {block} no longer exists", self.kind());
            return;
        }
        if block != self.block {
            log::trace!("Re-pointing {} from {} to {block}", self.kind(), self.block);
            self.block = block;
        }
        match &mut self.state {
            PropertyState::Alpha(p) => p.read(source, block),
            PropertyState::ZBuffer(p) => p.read(source, block),
            PropertyState::Material(p) => p.read(source, block),
            PropertyState::Texturing(p) => p.read(source, block),
            PropertyState::Specular(p) => p.read(source, block),
            PropertyState::Wireframe(p) => p.read(source, block),
        }
    }

    /// Registers an animation controller on this property. Only material and
    /// texturing properties accept controllers; for other kinds this does
    /// nothing.
    pub fn set_controller(&mut self, source: &dyn SceneSource, controller: BlockHandle) {
        match &mut self.state {
            PropertyState::Material(p) => p.set_controller(source, controller),
            PropertyState::Texturing(p) => p.set_controller(source, controller),
            _ => log::trace!("{} does not take controllers", self.kind()),
        }
    }
}

impl Animatable for Property {
    fn apply(&mut self, value: ControlValue) -> bool {
        match &mut self.state {
            PropertyState::Material(p) => p.apply(value),
            PropertyState::Texturing(p) => p.apply(value),
            _ => false,
        }
    }
}

/// A shared, reference-counted handle to a [`Property`].
///
/// Cloning a handle is cheap and only increments the reference count; the
/// property is dropped when the last handle goes away. Content changes made
/// through one handle are visible through every other.
#[derive(Debug, Clone)]
pub struct PropertyHandle(Rc<RefCell<Property>>);

impl PropertyHandle {
    /// Wraps a property in a new handle.
    pub fn new(property: Property) -> Self {
        Self(Rc::new(RefCell::new(property)))
    }

    /// Returns the kind of the property.
    pub fn kind(&self) -> PropertyKind {
        self.0.borrow().kind()
    }

    /// Returns the block the property reads from.
    pub fn block(&self) -> BlockHandle {
        self.0.borrow().block()
    }

    /// Returns the number of handles sharing this property.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Returns `true` if both handles point at the same property instance.
    pub fn ptr_eq(&self, other: &PropertyHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrows the property.
    ///
    /// # Panics
    ///
    /// Panics if the property is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Property> {
        self.0.borrow()
    }

    /// Borrows the property narrowed to `T`, or returns `None` if the kinds
    /// differ.
    pub fn cast<T: PropertyType>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), |p| p.cast::<T>()).ok()
    }

    /// Mutably borrows the property narrowed to `T`.
    pub fn cast_mut<T: PropertyType>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.0.borrow_mut(), |p| p.cast_mut::<T>()).ok()
    }

    /// See [`Property::update`].
    pub fn update(&self, source: &dyn SceneSource, block: BlockHandle) {
        self.0.borrow_mut().update(source, block);
    }

    /// Re-reads the property from the block it is bound to.
    pub fn refresh(&self, source: &dyn SceneSource) {
        let block = self.block();
        self.update(source, block);
    }

    /// See [`Property::set_controller`].
    pub fn set_controller(&self, source: &dyn SceneSource, controller: BlockHandle) {
        self.0.borrow_mut().set_controller(source, controller);
    }

    /// Pushes a sampled controller value into the property.
    pub fn apply(&self, value: ControlValue) -> bool {
        self.0.borrow_mut().apply(value)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Property>> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn from_rc(rc: Rc<RefCell<Property>>) -> Self {
        Self(rc)
    }
}

/// Test functions of the source format, by index.
const COMPARE_MAP: [CompareFunction; 8] = [
    CompareFunction::Always,
    CompareFunction::Less,
    CompareFunction::Equal,
    CompareFunction::LessEqual,
    CompareFunction::Greater,
    CompareFunction::NotEqual,
    CompareFunction::GreaterEqual,
    CompareFunction::Never,
];

pub(crate) fn compare_from_index(index: i64) -> CompareFunction {
    COMPARE_MAP[(index & 0x07) as usize]
}

/// Unwraps a field read, substituting `default` when it fails.
///
/// Missing fields are expected and stay quiet; wrong-typed values and vanished
/// blocks are logged.
pub(crate) fn read_or_default<T>(result: Result<T, SourceError>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(SourceError::MissingField { .. }) => default,
        Err(err @ SourceError::TypeMismatch { .. }) => {
            log::warn!("{err}, using default");
            default
        }
        Err(err) => {
            log::debug!("{err}");
            default
        }
    }
}
