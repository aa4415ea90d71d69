// Implemented by owners of channel subscriptions: the listener closures hold Rc clones,
// so the subscription has to be broken by hand before the owner goes away.
pub trait Destroyable {
    fn destroy(&mut self);
}
