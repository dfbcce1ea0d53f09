use slotmap::new_key_type;

new_key_type! {
    /// Identifies a tileable placed in a grid layer.
    ///
    /// Keys are per layer: the terrain, live and queue layers each hand out
    /// their own. Power conduction edges and targeting only ever refer to
    /// keys of the live layer.
    pub struct EntityId;

    /// Identifies a tile tracked by a free layer (mobs, projectiles).
    /// Stays valid while the tile moves.
    pub struct FreeTileId;
}
